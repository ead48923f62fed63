use ammonia;

/// Clean teacher-authored rich text (question prompts, material titles)
/// using the ammonia library.
///
/// Whitelist-based sanitization: safe tags like <b> and <p> survive,
/// <script>/<iframe> and event-handler attributes are stripped. Serves as a
/// fail-safe against stored XSS when content is rendered by the dashboard.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
