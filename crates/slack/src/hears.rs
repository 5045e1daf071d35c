use std::sync::Arc;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use crate::events::{EventContext, EventHandlerError, HandlerResult, MessageEvent, MessageKind};

/// Case-insensitive, unanchored message pattern.
#[derive(Clone, Debug)]
pub struct Pattern(Regex);

impl Pattern {
    /// Matches `literal` anywhere in the text; regex metacharacters are escaped.
    pub fn phrase(literal: &str) -> Result<Self, regex::Error> {
        Self::regex(&regex::escape(literal))
    }

    pub fn regex(expression: &str) -> Result<Self, regex::Error> {
        RegexBuilder::new(expression).case_insensitive(true).build().map(Self)
    }

    pub fn phrases(literals: &[&str]) -> Result<Vec<Self>, regex::Error> {
        literals.iter().map(|literal| Self::phrase(literal)).collect()
    }

    /// Whole match at index 0 followed by each capture group; groups that
    /// did not participate come back empty.
    pub fn captures(&self, text: &str) -> Option<Vec<String>> {
        self.0.captures(text).map(|captures| {
            captures
                .iter()
                .map(|group| group.map(|m| m.as_str().to_owned()).unwrap_or_default())
                .collect()
        })
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeardMessage {
    pub event: MessageEvent,
    pub matches: Vec<String>,
}

impl HeardMessage {
    pub fn group(&self, index: usize) -> &str {
        self.matches.get(index).map(String::as_str).unwrap_or_default()
    }
}

#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(
        &self,
        heard: &HeardMessage,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

struct Route {
    name: &'static str,
    kinds: Vec<MessageKind>,
    patterns: Vec<Pattern>,
    handler: Arc<dyn MessageHandler>,
}

pub struct RouteMatch<'a> {
    pub name: &'static str,
    pub handler: &'a Arc<dyn MessageHandler>,
    pub matches: Vec<String>,
}

/// Ordered (message kinds, patterns) → handler table. Evaluated in
/// registration order; the first route whose kind filter and any pattern
/// match wins.
#[derive(Default)]
pub struct HearsTable {
    routes: Vec<Route>,
}

impl HearsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(
        &mut self,
        name: &'static str,
        patterns: Vec<Pattern>,
        kinds: &[MessageKind],
        handler: H,
    ) where
        H: MessageHandler + 'static,
    {
        self.routes.push(Route {
            name,
            kinds: kinds.to_vec(),
            patterns,
            handler: Arc::new(handler),
        });
    }

    pub fn find(&self, event: &MessageEvent) -> Option<RouteMatch<'_>> {
        self.routes.iter().filter(|route| route.kinds.contains(&event.kind)).find_map(|route| {
            route.patterns.iter().find_map(|pattern| pattern.captures(&event.text)).map(
                |matches| RouteMatch { name: route.name, handler: &route.handler, matches },
            )
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
