// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with **bold**, _emphasis_ and `code`.\n\n- Bullet point with ~~strike~~\n- Another item\n\n1. First\n2. Second\n\n---\n\n";
    base.repeat(size)
}

/// A line mixing every inline delimiter, nested and unmatched.
#[allow(dead_code)]
pub fn generate_inline_line(words: usize) -> String {
    let pieces = [
        "plain",
        "**strong**",
        "*em*",
        "__strong__",
        "_em_",
        "~~gone~~",
        "`code`",
        "**outer *inner* outer**",
        "stray*",
        "snake_case_name",
    ];
    (0..words)
        .map(|i| pieces[i % pieces.len()])
        .collect::<Vec<_>>()
        .join(" ")
}
