// SPDX-License-Identifier: MIT

//! Template substitution and join separator conventions

/// The only placeholder templates recognize
pub const PLACEHOLDER: &str = "{{input}}";

/// Separator spelling for a newline in the node editor
const NEW_LINE_WORD: &str = "(new line)";

pub fn has_placeholder(template: &str) -> bool {
    template.contains(PLACEHOLDER)
}

/// Replace every placeholder with `input`, or with nothing when absent
pub fn render(template: &str, input: Option<&str>) -> String {
    template.replace(PLACEHOLDER, input.unwrap_or(""))
}

/// Turn a stored separator into the string actually inserted
pub fn unescape_separator(separator: &str) -> String {
    separator.replace(NEW_LINE_WORD, "\n").replace("\\n", "\n")
}
