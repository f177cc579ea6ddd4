use anyhow::{Context, Result};
use ego_tree::NodeRef;
use reqwest::Client;
use scraper::{node::Node, Html};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const API_BASE: &str = "https://api.telegra.ph";

/// Tags Telegraph accepts as-is.
const ALLOWED_TAGS: &[&str] = &[
    "a",
    "aside",
    "b",
    "blockquote",
    "br",
    "code",
    "em",
    "figcaption",
    "figure",
    "h3",
    "h4",
    "hr",
    "i",
    "iframe",
    "img",
    "li",
    "ol",
    "p",
    "pre",
    "s",
    "strong",
    "u",
    "ul",
    "video",
];

/// Tags whose content is removed entirely, not just unwrapped.
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "head", "title", "meta", "link", "template", "noscript",
];

const ALLOWED_ATTRS: &[&str] = &["href", "src"];

/// A node of Telegraph page content, serialized as either a bare string or
/// a `{tag, attrs, children}` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentNode {
    Text(String),
    Element {
        tag: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        attrs: Option<BTreeMap<String, String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        children: Option<Vec<ContentNode>>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub path: String,
    pub url: String,
}

#[derive(Serialize)]
struct PageRequest<'a> {
    access_token: &'a str,
    title: &'a str,
    content: &'a [ContentNode],
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Page>,
    #[serde(default)]
    error: Option<String>,
}

pub struct TelegraphClient {
    client: Client,
    access_token: String,
}

impl TelegraphClient {
    pub fn new(access_token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            access_token,
        })
    }

    /// Create a page from HTML. The content is sanitized down to the tag
    /// subset Telegraph accepts before submission.
    pub async fn create_page(&self, title: &str, html_content: &str) -> Result<Page> {
        let content = html_to_nodes(html_content);
        self.call(&format!("{}/createPage", API_BASE), title, &content)
            .await
            .context("Failed to create Telegraph page")
    }

    pub async fn edit_page(&self, path: &str, title: &str, html_content: &str) -> Result<Page> {
        let content = html_to_nodes(html_content);
        self.call(&format!("{}/editPage/{}", API_BASE, path), title, &content)
            .await
            .with_context(|| format!("Failed to edit Telegraph page {}", path))
    }

    async fn call(&self, url: &str, title: &str, content: &[ContentNode]) -> Result<Page> {
        let request = PageRequest {
            access_token: &self.access_token,
            title,
            content,
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to the Telegraph API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Telegraph API returned error: {} - {}", status, error_text);
        }

        let api_response = response
            .json::<ApiResponse>()
            .await
            .context("Failed to parse Telegraph API response")?;

        if !api_response.ok {
            anyhow::bail!(
                "Telegraph API error: {}",
                api_response.error.unwrap_or_else(|| "unknown".to_string())
            );
        }

        api_response
            .result
            .context("Telegraph API reported ok without a result")
    }
}

/// Convert HTML into sanitized Telegraph content nodes: h1/h2 become h3,
/// h5/h6 become h4, container tags contribute only their children, and
/// script-like tags vanish with their content. Only href/src attributes
/// survive.
pub fn html_to_nodes(html: &str) -> Vec<ContentNode> {
    let fragment = Html::parse_fragment(html);
    let mut nodes = Vec::new();
    for child in fragment.root_element().children() {
        convert_node(child, &mut nodes);
    }
    nodes
}

fn remap_tag(tag: &str) -> &str {
    match tag {
        "h1" | "h2" => "h3",
        "h5" | "h6" => "h4",
        "strike" | "del" => "s",
        other => other,
    }
}

fn convert_node(node: NodeRef<'_, Node>, out: &mut Vec<ContentNode>) {
    match node.value() {
        Node::Text(text) => {
            if !text.text.is_empty() {
                out.push(ContentNode::Text(text.text.to_string()));
            }
        }
        Node::Element(element) => {
            let tag = remap_tag(element.name());
            if DROPPED_TAGS.contains(&tag) {
                return;
            }
            if !ALLOWED_TAGS.contains(&tag) {
                // Unknown containers are unwrapped into their children.
                for child in node.children() {
                    convert_node(child, out);
                }
                return;
            }

            let attrs: BTreeMap<String, String> = element
                .attrs()
                .filter(|(name, _)| ALLOWED_ATTRS.contains(name))
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();

            let mut children = Vec::new();
            for child in node.children() {
                convert_node(child, &mut children);
            }

            out.push(ContentNode::Element {
                tag: tag.to_string(),
                attrs: (!attrs.is_empty()).then_some(attrs),
                children: (!children.is_empty()).then_some(children),
            });
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> ContentNode {
        ContentNode::Text(s.to_string())
    }

    fn element(tag: &str, children: Vec<ContentNode>) -> ContentNode {
        ContentNode::Element {
            tag: tag.to_string(),
            attrs: None,
            children: (!children.is_empty()).then_some(children),
        }
    }

    #[test]
    fn test_plain_text_becomes_a_text_node() {
        assert_eq!(html_to_nodes("stub"), vec![text("stub")]);
    }

    #[test]
    fn test_headings_are_remapped() {
        assert_eq!(
            html_to_nodes("<h1>big</h1><h6>small</h6>"),
            vec![element("h3", vec![text("big")]), element("h4", vec![text("small")])]
        );
    }

    #[test]
    fn test_containers_are_unwrapped() {
        assert_eq!(
            html_to_nodes("<div><p>a</p><span>b</span></div>"),
            vec![element("p", vec![text("a")]), text("b")]
        );
    }

    #[test]
    fn test_script_is_dropped_with_its_content() {
        assert_eq!(
            html_to_nodes("<p>keep</p><script>alert(1)</script>"),
            vec![element("p", vec![text("keep")])]
        );
    }

    #[test]
    fn test_only_href_and_src_attributes_survive() {
        let nodes = html_to_nodes("<a href=\"https://x\" class=\"c\" id=\"i\">link</a>");
        let ContentNode::Element { tag, attrs, .. } = &nodes[0] else {
            panic!("expected an element");
        };
        assert_eq!(tag, "a");
        let attrs = attrs.as_ref().unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs["href"], "https://x");
    }

    #[test]
    fn test_serialization_shape() {
        let json = serde_json::to_value(html_to_nodes("<p>a<br>b</p>")).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"tag": "p", "children": ["a", {"tag": "br"}, "b"]}
            ])
        );
    }
}
