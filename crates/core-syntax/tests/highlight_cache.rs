//! End-to-end cache behavior over a multi-line grammar: a `/* ... */`
//! block-comment tokenizer whose state crosses line boundaries, driven the
//! way a render loop would drive it (fetch visible lines, edit, invalidate,
//! then pump `update_dirty` a window at a time).

use core_syntax::{Highlighter, Token, TokenKind, Tokenizer, STATE_NONE};
use core_text::Buffer;

const CODE: TokenKind = TokenKind(1);
const COMMENT: TokenKind = TokenKind(2);
const IN_COMMENT: u64 = 1;

struct CommentTokenizer;

impl Tokenizer for CommentTokenizer {
    fn tokenize(&self, text: &str, state: u64) -> (Vec<Token>, u64) {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut state = state;
        let mut span_start = 0;
        let mut i = 0;
        while i < chars.len() {
            if state == STATE_NONE && i + 1 < chars.len() && chars[i] == '/' && chars[i + 1] == '*'
            {
                if i > span_start {
                    tokens.push(Token {
                        kind: CODE,
                        len: i - span_start,
                    });
                }
                span_start = i;
                state = IN_COMMENT;
                i += 2;
            } else if state == IN_COMMENT
                && i + 1 < chars.len()
                && chars[i] == '*'
                && chars[i + 1] == '/'
            {
                i += 2;
                tokens.push(Token {
                    kind: COMMENT,
                    len: i - span_start,
                });
                span_start = i;
                state = STATE_NONE;
            } else {
                i += 1;
            }
        }
        if chars.len() > span_start {
            tokens.push(Token {
                kind: if state == IN_COMMENT { COMMENT } else { CODE },
                len: chars.len() - span_start,
            });
        }
        (tokens, state)
    }
}

fn fetch_all(hl: &mut Highlighter, doc: &Buffer) {
    for i in 0..core_text::Document::line_count(doc) {
        // Twice: the second fetch is a cache hit and raises the frontier.
        hl.line(doc, &CommentTokenizer, i);
        hl.line(doc, &CommentTokenizer, i);
    }
}

#[test]
fn comment_state_spans_lines() {
    let doc = Buffer::from_str("t", "fn main() { /* start\nstill inside\nend */ done()").unwrap();
    let mut hl = Highlighter::new();
    fetch_all(&mut hl, &doc);

    let line0 = hl.cached_line(0).unwrap();
    assert_eq!(line0.tokens.last().unwrap().kind, COMMENT);
    assert_eq!(line0.state, IN_COMMENT);

    let line1 = hl.cached_line(1).unwrap();
    assert_eq!(line1.init_state, IN_COMMENT);
    assert_eq!(line1.tokens, vec![Token { kind: COMMENT, len: 12 }]);

    let line2 = hl.cached_line(2).unwrap();
    assert_eq!(line2.state, STATE_NONE);
    assert_eq!(line2.tokens.first().unwrap().kind, COMMENT);
    assert_eq!(line2.tokens.last().unwrap().kind, CODE);
}

#[test]
fn edit_recomputes_only_until_state_converges() {
    // Opening a comment on line 0 must ripple down; lines whose input state
    // is unchanged are left alone.
    let mut doc = Buffer::from_str("t", "aaa\nbbb\nccc\nddd").unwrap();
    let mut hl = Highlighter::new();
    fetch_all(&mut hl, &doc);
    hl.update_dirty(&doc, &CommentTokenizer, 16);
    assert!(hl.cached_line(3).unwrap().tokens[0].kind == CODE);

    doc.replace_lines(0, 0, "/* open\n");
    hl.invalidate(&doc, 0);
    fetch_all(&mut hl, &doc); // re-fetch raises the frontier back to 3

    assert!(hl.update_dirty(&doc, &CommentTokenizer, 16));
    for i in 1..4 {
        let entry = hl.cached_line(i).unwrap();
        assert_eq!(entry.init_state, IN_COMMENT, "line {i} input state");
        assert_eq!(entry.tokens[0].kind, COMMENT, "line {i} token kind");
    }
    // Fixed point reached: a second pump finds nothing to redo.
    assert!(!hl.update_dirty(&doc, &CommentTokenizer, 16));
}

#[test]
fn update_dirty_is_bounded_by_the_window() {
    let text = (0..12).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
    let mut doc = Buffer::from_str("t", &text).unwrap();
    let mut hl = Highlighter::new();
    fetch_all(&mut hl, &doc);
    hl.update_dirty(&doc, &CommentTokenizer, 32);

    doc.replace_lines(0, 0, "/* open\n");
    hl.invalidate(&doc, 0);
    fetch_all(&mut hl, &doc);

    // Window of 4 per pump: convergence takes several frames, and each pump
    // advances the invalid frontier monotonically.
    let mut pumps = 0;
    let mut last_frontier = hl.first_invalid_line();
    while hl.update_dirty(&doc, &CommentTokenizer, 4) {
        assert!(hl.first_invalid_line() > last_frontier);
        last_frontier = hl.first_invalid_line();
        pumps += 1;
        assert!(pumps < 16, "update_dirty failed to converge");
    }
    assert!(pumps >= 2, "window should force multiple pumps");
    assert_eq!(hl.cached_line(11).unwrap().init_state, IN_COMMENT);
}

#[test]
fn closing_a_comment_restores_downstream_lines() {
    let mut doc = Buffer::from_str("t", "/* open\nmiddle\ntail").unwrap();
    let mut hl = Highlighter::new();
    fetch_all(&mut hl, &doc);
    hl.update_dirty(&doc, &CommentTokenizer, 8);
    assert_eq!(hl.cached_line(2).unwrap().tokens[0].kind, COMMENT);

    doc.replace_lines(0, 0, "/* open */ code\n");
    hl.invalidate(&doc, 0);
    fetch_all(&mut hl, &doc);
    while hl.update_dirty(&doc, &CommentTokenizer, 8) {}

    let tail = hl.cached_line(2).unwrap();
    assert_eq!(tail.init_state, STATE_NONE);
    assert_eq!(tail.tokens, vec![Token { kind: CODE, len: 4 }]);
}

#[test]
fn shrinking_document_clamps_the_frontier() {
    let mut doc = Buffer::from_str("t", "a\nb\nc\nd\ne").unwrap();
    let mut hl = Highlighter::new();
    fetch_all(&mut hl, &doc);
    assert_eq!(hl.max_wanted_line(), 4);

    // "b".."e" removed; the rope keeps line 0's newline so two lines remain.
    doc.replace_lines(1, 4, "");
    assert_eq!(core_text::Document::line_count(&doc), 2);
    hl.invalidate(&doc, 0);
    assert_eq!(hl.max_wanted_line(), 1);

    // The old line 1 entry is stale by hash; fetching it recomputes.
    let entry = hl.line(&doc, &CommentTokenizer, 1);
    assert!(entry.tokens.is_empty());
}
