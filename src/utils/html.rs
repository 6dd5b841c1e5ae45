// src/utils/html.rs

/// Strips unsafe markup from user-supplied text before it is stored.
///
/// Whitelist based: harmless formatting tags (<b>, <p>, ...) survive, while
/// <script>/<style> are removed together with their content and event-handler
/// attributes are dropped. Quiz descriptions go through this; titles are
/// plain text and are stored as entered.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_is_removed_with_content() {
        assert_eq!(clean_html("Intro<script>alert(1)</script>"), "Intro");
    }

    #[test]
    fn test_event_handlers_are_dropped() {
        assert_eq!(
            clean_html(r#"<b onclick="steal()">bold</b>"#),
            "<b>bold</b>"
        );
    }

    #[test]
    fn test_plain_text_is_untouched() {
        assert_eq!(clean_html("World capitals"), "World capitals");
    }
}
