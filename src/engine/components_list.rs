//! `COMPONENTS_LIST` compile-time define
//!
//! Firmware reports which component versions it was built with through a
//! string define: `"foo:v1.2 bar:v2.0 "` (every item followed by a space).

use crate::core::entry::DependencyEntry;

pub const DEFINE_NAME: &str = "COMPONENTS_LIST";

/// `name:version ` for every entry, in declaration order.
pub fn components_list(entries: &[DependencyEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}:{} ", e.name, e.remote.version))
        .collect()
}

fn c_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Compiler flag form, with the quotes escaped for the build system's shell:
/// `-DCOMPONENTS_LIST=\"foo:v1.2 \"`
pub fn define_flag(list: &str) -> String {
    format!("-D{}=\\\"{}\\\"", DEFINE_NAME, c_escape(list))
}

/// C header form.
pub fn header(list: &str) -> String {
    format!(
        "// Generated by depfetch - do not edit\n#pragma once\n\n#define {} \"{}\"\n",
        DEFINE_NAME,
        c_escape(list)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::{parse_asset_entries, parse_url_entries};

    #[test]
    fn test_list_from_assets() {
        let entries =
            parse_asset_entries("foo<-foo.tar.gz<-v1.2<-acme/foo bar<-bar.tar.gz<-2.0.1<-acme/bar")
                .unwrap();
        assert_eq!(components_list(&entries), "foo:v1.2 bar:2.0.1 ");
    }

    #[test]
    fn test_list_from_urls_uses_release_tag() {
        let entries =
            parse_url_entries("foo<-https://github.com/acme/foo/releases/download/v1.2/foo.tar.gz")
                .unwrap();
        assert_eq!(components_list(&entries), "foo:v1.2 ");
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(components_list(&[]), "");
        assert_eq!(define_flag(""), "-DCOMPONENTS_LIST=\\\"\\\"");
    }

    #[test]
    fn test_define_flag() {
        assert_eq!(
            define_flag("foo:v1.2 "),
            r#"-DCOMPONENTS_LIST=\"foo:v1.2 \""#
        );
    }

    #[test]
    fn test_header() {
        let h = header("foo:v1.2 ");
        assert!(h.contains("#pragma once"));
        assert!(h.contains("#define COMPONENTS_LIST \"foo:v1.2 \""));
    }

    #[test]
    fn test_quotes_escaped() {
        assert_eq!(c_escape(r#"a"b\c"#), r#"a\"b\\c"#);
    }
}
