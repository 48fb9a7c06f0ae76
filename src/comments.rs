//! Embeds a third-party discussion thread (utterances) into post pages. The
//! widget is opaque: this module only produces the script element that loads
//! it, keyed on a stable page identity.

use pulldown_cmark::escape::escape_html;
use serde::Deserialize;
use std::io;

const CLIENT_URL: &str = "https://utteranc.es/client.js";

fn default_theme() -> String {
    String::from("github-dark")
}

/// Configuration for the comment widget.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CommentWidget {
    /// The repository whose issues hold the threads, e.g. `owner/blog`.
    pub repo: String,

    #[serde(default = "default_theme")]
    pub theme: String,
}

impl CommentWidget {
    /// Renders the embed markup for the page identified by `identity` (e.g.
    /// the page path). The same identity always maps to the same thread.
    pub fn render(&self, identity: &str) -> io::Result<String> {
        let mut out = String::from(r#"<div class="comments"><script src=""#);
        out.push_str(CLIENT_URL);
        out.push_str(r#"" repo=""#);
        escape_html(&mut out, &self.repo)?;
        out.push_str(r#"" issue-term=""#);
        escape_html(&mut out, identity)?;
        out.push_str(r#"" theme=""#);
        escape_html(&mut out, &self.theme)?;
        out.push_str(r#"" crossorigin="anonymous" async></script></div>"#);
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_render() -> io::Result<()> {
        let widget = CommentWidget {
            repo: "wellington/blog".to_owned(),
            theme: default_theme(),
        };
        assert_eq!(
            concat!(
                r#"<div class="comments"><script src="https://utteranc.es/client.js" "#,
                r#"repo="wellington/blog" issue-term="/post/hello" theme="github-dark" "#,
                r#"crossorigin="anonymous" async></script></div>"#,
            ),
            widget.render("/post/hello")?
        );
        Ok(())
    }

    #[test]
    fn test_render_escapes_attributes() -> io::Result<()> {
        let widget = CommentWidget {
            repo: r#"a"><script>"#.to_owned(),
            theme: default_theme(),
        };
        let markup = widget.render("/post/x")?;
        assert!(markup.contains("repo=\"a&quot;&gt;&lt;script&gt;\""));
        Ok(())
    }

    #[test]
    fn test_theme_defaults() -> serde_yaml::Result<()> {
        let widget: CommentWidget = serde_yaml::from_str("repo: owner/blog")?;
        assert_eq!("github-dark", widget.theme);
        Ok(())
    }
}
