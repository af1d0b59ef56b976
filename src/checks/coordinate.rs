//! Artifact coordinates for dependency and plugin declarations

use crate::xml::ElementRef;

pub const UNKNOWN_GROUP_ID: &str = "[unknown-groupid]";
pub const UNKNOWN_ARTIFACT_ID: &str = "[unknown-artifactid]";
pub const UNKNOWN_VERSION: &str = "[unknown-version]";

/// Build the `groupId:artifactId:version` string for a declaration element.
///
/// Each field is the first descendant with that name in document order;
/// missing fields fall back to bracketed placeholders, so the result always
/// has three parts.
pub fn describe(element: &ElementRef<'_>) -> String {
    tracing::debug!("Describing element <{}> at line {}", element.name(), element.line());

    let field = |name: &str, fallback: &str| {
        element
            .first_descendant(name)
            .map(|child| child.text_content())
            .unwrap_or_else(|| fallback.to_string())
    };

    format!(
        "{}:{}:{}",
        field("groupId", UNKNOWN_GROUP_ID),
        field("artifactId", UNKNOWN_ARTIFACT_ID),
        field("version", UNKNOWN_VERSION)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_bytes;

    #[test]
    fn test_full_coordinate() {
        let doc = parse_bytes(
            b"<dependency><groupId>org.acme</groupId><artifactId>core</artifactId><version>1.0</version></dependency>",
        )
        .unwrap();

        assert_eq!(describe(&doc.root()), "org.acme:core:1.0");
    }

    #[test]
    fn test_missing_version_uses_placeholder() {
        let doc = parse_bytes(
            b"<plugin><groupId>org.acme</groupId><artifactId>maven-thing</artifactId></plugin>",
        )
        .unwrap();

        let coordinate = describe(&doc.root());
        assert_eq!(coordinate, "org.acme:maven-thing:[unknown-version]");
        assert!(coordinate.ends_with(":[unknown-version]"));
    }

    #[test]
    fn test_properties_container_is_all_placeholders() {
        let doc = parse_bytes(b"<properties><foo.version>2.0-SNAPSHOT</foo.version></properties>")
            .unwrap();

        assert_eq!(
            describe(&doc.root()),
            "[unknown-groupid]:[unknown-artifactid]:[unknown-version]"
        );
    }

    #[test]
    fn test_first_match_wins() {
        let doc = parse_bytes(
            b"<dependency><artifactId>a</artifactId><artifactId>b</artifactId></dependency>",
        )
        .unwrap();

        assert_eq!(describe(&doc.root()), "[unknown-groupid]:a:[unknown-version]");
    }

    #[test]
    fn test_nested_fields_are_found_in_document_order() {
        let doc = parse_bytes(
            b"<plugin><artifactId>p</artifactId><dependencies><dependency><groupId>g</groupId></dependency></dependencies><version>1</version></plugin>",
        )
        .unwrap();

        assert_eq!(describe(&doc.root()), "g:p:1");
    }

    #[test]
    fn test_nested_field_before_direct_child() {
        let doc = parse_bytes(
            b"<plugin><dependencies><dependency><version>9</version></dependency></dependencies><version>1</version></plugin>",
        )
        .unwrap();

        assert_eq!(describe(&doc.root()), "[unknown-groupid]:[unknown-artifactid]:9");
    }
}
