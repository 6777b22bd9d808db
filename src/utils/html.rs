// src/utils/html.rs

/// Cleans admin-entered rich text (quiz descriptions, batch blurbs) before it is stored.
///
/// Whitelist-based: safe formatting tags such as <b> and <p> survive, while
/// <script>, <iframe> and event-handler attributes are stripped together with
/// their content. The marketing pages render these fields as HTML.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_and_handlers() {
        assert_eq!(clean_html("<p onclick=\"x()\">Hi</p>"), "<p>Hi</p>");
        assert_eq!(clean_html("ok<script>steal()</script>"), "ok");
    }
}
