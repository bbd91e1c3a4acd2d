//! `Link` header traversal for Canvas's paginated collection endpoints.

/// Extract the `rel="next"` target from an RFC 8288 `Link` header value.
///
/// Canvas emits entries like `<https://…/courses?page=2>; rel="next"`,
/// comma-separated with `current`, `first`, `last` and friends. Returns
/// `None` when no entry carries the `next` relation, which terminates the
/// page walk.
pub(crate) fn next_page_url(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut pieces = entry.split(';');
        let target = pieces.next()?.trim();
        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        let is_next = pieces.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        is_next.then(|| url.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::next_page_url;

    #[test]
    fn finds_next_among_multiple_relations() {
        let header = "<https://canvas.test/api/v1/courses?page=1>; rel=\"current\",\
                      <https://canvas.test/api/v1/courses?page=2>; rel=\"next\",\
                      <https://canvas.test/api/v1/courses?page=9>; rel=\"last\"";
        assert_eq!(
            next_page_url(header).as_deref(),
            Some("https://canvas.test/api/v1/courses?page=2")
        );
    }

    #[test]
    fn missing_next_relation_terminates() {
        let header = "<https://canvas.test/api/v1/courses?page=9>; rel=\"last\"";
        assert_eq!(next_page_url(header), None);
    }

    #[test]
    fn tolerates_unquoted_rel_parameter() {
        let header = "<https://canvas.test/api/v1/courses?page=3>; rel=next";
        assert_eq!(
            next_page_url(header).as_deref(),
            Some("https://canvas.test/api/v1/courses?page=3")
        );
    }

    #[test]
    fn malformed_entries_are_skipped() {
        assert_eq!(next_page_url(""), None);
        assert_eq!(next_page_url("not a link header"), None);
        assert_eq!(next_page_url("<unclosed; rel=\"next\""), None);
    }
}
