//! Post URL parsing
//!
//! Front-ends link posts as `.../@author/permlink` or with `author` and
//! `permlink` query parameters. Both are accepted, as are paths without a
//! scheme or host.

use url::{ParseError, Url};

const RELATIVE_BASE: &str = "https://localhost/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    pub author: String,
    pub permlink: String,
}

pub fn parse_post_url(text: &str) -> Option<PostRef> {
    let text = text.trim().to_lowercase();
    let url = match Url::parse(&text) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => {
            Url::parse(RELATIVE_BASE).ok()?.join(&text).ok()?
        }
        Err(_) => return None,
    };

    from_query(&url).or_else(|| from_path(&url))
}

fn from_query(url: &Url) -> Option<PostRef> {
    let mut author = None;
    let mut permlink = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "author" => author = Some(value.into_owned()),
            "permlink" => permlink = Some(value.into_owned()),
            _ => {}
        }
    }
    post_ref(author?, permlink?)
}

fn from_path(url: &Url) -> Option<PostRef> {
    let mut segments = url.path_segments()?.skip_while(|segment| !segment.starts_with('@'));
    let author = segments.next()?.trim_start_matches('@').to_string();
    let permlink = segments.next()?.to_string();
    post_ref(author, permlink)
}

fn post_ref(author: String, permlink: String) -> Option<PostRef> {
    if author.is_empty() || permlink.is_empty() {
        return None;
    }
    Some(PostRef { author, permlink })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(author: &str, permlink: &str) -> Option<PostRef> {
        Some(PostRef {
            author: author.to_string(),
            permlink: permlink.to_string(),
        })
    }

    #[test]
    fn test_path_form() {
        assert_eq!(
            parse_post_url("https://steemit.com/photography/@alice/my-first-post"),
            post("alice", "my-first-post")
        );
        assert_eq!(parse_post_url("https://golos.io/@bob/test"), post("bob", "test"));
    }

    #[test]
    fn test_url_is_lowercased() {
        assert_eq!(parse_post_url("https://steemit.com/@Alice/My-Post"), post("alice", "my-post"));
    }

    #[test]
    fn test_query_form_wins() {
        assert_eq!(
            parse_post_url("https://example.com/@ignored/path?author=carol&permlink=the-post"),
            post("carol", "the-post")
        );
        assert_eq!(
            parse_post_url("https://example.com/view?permlink=a%2Db&author=dave"),
            post("dave", "a-b")
        );
    }

    #[test]
    fn test_incomplete_query_falls_back_to_path() {
        assert_eq!(
            parse_post_url("https://example.com/@erin/post-1?author=frank"),
            post("erin", "post-1")
        );
    }

    #[test]
    fn test_relative_urls() {
        assert_eq!(parse_post_url("/@alice/hello"), post("alice", "hello"));
        assert_eq!(parse_post_url("steemit.com/@alice/hello"), post("alice", "hello"));
    }

    #[test]
    fn test_unusable_urls() {
        assert_eq!(parse_post_url("https://steemit.com/trending"), None);
        assert_eq!(parse_post_url("https://steemit.com/@alice"), None);
        assert_eq!(parse_post_url("https://steemit.com/@alice/"), None);
        assert_eq!(parse_post_url("https://steemit.com/@/post"), None);
        assert_eq!(parse_post_url(""), None);
    }
}
