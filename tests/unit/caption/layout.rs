use super::*;

#[test]
fn wrap_packs_words_greedily() {
    let lines = wrap("the quick brown fox jumps over the lazy dog", 15);
    assert_eq!(lines, vec!["the quick brown", "fox jumps over", "the lazy dog"]);
}

#[test]
fn wrap_allows_exact_fit() {
    assert_eq!(wrap("abc def", 7), vec!["abc def"]);
    assert_eq!(wrap("abc def", 6), vec!["abc", "def"]);
}

#[test]
fn long_word_sits_alone_and_is_not_split() {
    let lines = wrap("a supercalifragilistic b", 10);
    assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
}

#[test]
fn wrap_never_exceeds_width_except_for_lone_long_words() {
    let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
                tempor incididunt ut labore et dolore magna aliqua incomprehensibilities";
    for width in 1..40 {
        for line in wrap(text, width) {
            let len = line.chars().count();
            assert!(
                len <= width || !line.contains(' '),
                "width {width}: '{line}' ({len})"
            );
        }
    }
}

#[test]
fn wrap_counts_characters_not_bytes() {
    assert_eq!(wrap("héllo wörld", 11), vec!["héllo wörld"]);
}

#[test]
fn wrap_of_blank_text_is_empty() {
    assert!(wrap("   \n\t ", 60).is_empty());
}

#[test]
fn escape_neutralizes_filter_syntax() {
    assert_eq!(escape("a:b,c"), "a\\:b\\,c");
    assert_eq!(escape("[x]=y;z"), "\\[x\\]\\=y\\;z");
    assert_eq!(escape("it's"), "it\u{2019}s");
    assert_eq!(escape("back\\slash"), "back\\\\slash");
    assert_eq!(escape("tab\there"), "tab here");
}

#[test]
fn escape_is_idempotent() {
    let samples = [
        "plain words",
        "time: 10:30, ok?",
        "it's [bracketed] = ; done",
        "C:\\path\\to\\file",
        "trailing backslash \\",
        "\\\\: mixed \\' quotes '",
        "100% sure",
        "",
    ];
    for s in samples {
        let once = escape(s);
        assert_eq!(escape(&once), once, "input: {s:?}");
    }
}

#[test]
fn escaped_text_has_no_bare_specials() {
    let out = escape("a'b:c,d[e]f=g;h\\i");
    assert!(!out.contains('\''));
    let chars: Vec<char> = out.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' {
            assert!(i + 1 < chars.len());
            i += 2;
            continue;
        }
        assert!(!matches!(chars[i], ':' | ',' | '[' | ']' | '=' | ';'));
        i += 1;
    }
}

#[test]
fn bottom_layout_stacks_lines_upward_from_margin() {
    let layout = CaptionLayout::new(
        vec!["first".to_string(), "second".to_string()],
        28,
        8,
        Anchor::Bottom { margin: 100 },
    );
    assert_eq!(layout.line_height(), 51);
    assert_eq!(layout.y_expr(0), "h-202");
    assert_eq!(layout.y_expr(1), "h-151");
    assert_eq!(layout.x_expr(), "(w-text_w)/2");
}

#[test]
fn out_of_range_line_index_sits_on_the_last_line() {
    let layout = CaptionLayout::new(
        vec!["only".to_string()],
        28,
        8,
        Anchor::Bottom { margin: 100 },
    );
    assert_eq!(layout.y_expr(5), layout.y_expr(0));
    let empty = CaptionLayout::new(Vec::new(), 28, 8, Anchor::Bottom { margin: 100 });
    assert_eq!(empty.y_expr(0), "h-100");
}

#[test]
fn center_layout_centers_the_block() {
    let layout = CaptionLayout::wrapped("one two", 3, 40, 0, Anchor::Center);
    assert_eq!(layout.lines(), ["one", "two"]);
    let placements: Vec<_> = layout.placements().collect();
    assert_eq!(placements[0], ("one", "(h-100)/2+0".to_string()));
    assert_eq!(placements[1], ("two", "(h-100)/2+50".to_string()));
}
