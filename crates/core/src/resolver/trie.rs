//! Literal/parameter prefix tree matching URL path tokens against templates.
//!
//! Each level branches on one URL segment: a literal key must match exactly,
//! a `{param}` key captures the segment. The tree is append-only, so URLs
//! issued against superseded API versions keep parsing for the process
//! lifetime.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{RegistryError, ResolveError};
use crate::model::collection::CollectionSchema;
use crate::resolver::template::percent_decode;

#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    children: HashMap<String, TrieNode>,
    leaf: Option<Rc<CollectionSchema>>,
}

fn is_param_token(token: &str) -> bool {
    token.starts_with('{') && token.ends_with('}')
}

fn param_name(token: &str) -> Option<&str> {
    token.strip_prefix('{')?.strip_suffix('}')
}

impl TrieNode {
    /// Insert a token path, reusing existing branches. Every level must stay
    /// all-literal or single-parameter; the walk depends on that invariant.
    pub fn insert(
        &mut self,
        tokens: &[String],
        schema: Rc<CollectionSchema>,
    ) -> Result<(), RegistryError> {
        let mut node = self;
        for token in tokens {
            if !node.children.contains_key(token) && !node.children.is_empty() {
                let level_has_param = node.children.keys().any(|key| is_param_token(key));
                if is_param_token(token) || level_has_param {
                    return Err(RegistryError::MixedTrieBranch {
                        token: token.clone(),
                    });
                }
            }
            node = node.children.entry(token.clone()).or_default();
        }
        if let Some(existing) = &node.leaf {
            if existing.full_name != schema.full_name {
                return Err(RegistryError::AmbiguousResourcePath {
                    existing: existing.full_name.clone(),
                    incoming: schema.full_name.clone(),
                    path: tokens.join("/"),
                });
            }
        }
        node.leaf = Some(schema);
        Ok(())
    }

    /// Match URL tokens to a collection schema plus captured parameter
    /// values. Literal keys descend exactly; a lone parameter key captures
    /// the token; a terminal parameter followed only by the leaf swallows
    /// every remaining token, since resource names may contain `/`.
    pub fn walk(
        &self,
        tokens: &[String],
        url: &str,
    ) -> Result<(Rc<CollectionSchema>, HashMap<String, String>), ResolveError> {
        let invalid = || ResolveError::InvalidResource {
            line: url.to_owned(),
        };

        let mut node = self;
        let mut params = HashMap::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            if let Some(next) = node.children.get(token) {
                node = next;
            } else if node.children.len() == 1 {
                let (key, next) = node.children.iter().next().ok_or_else(invalid)?;
                let param = param_name(key).ok_or_else(invalid)?;
                if next.children.is_empty() && next.leaf.is_some() {
                    // Terminal collapse: the rest of the URL is one value.
                    let rest = tokens[i..].join("/");
                    params.insert(param.to_owned(), percent_decode(&rest));
                    node = next;
                    break;
                }
                params.insert(param.to_owned(), percent_decode(token));
                node = next;
            } else {
                return Err(invalid());
            }
            i += 1;
        }

        match &node.leaf {
            Some(schema) => Ok((schema.clone(), params)),
            None => Err(invalid()),
        }
    }
}
