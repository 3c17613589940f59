//! The six pipeline interceptors.
//!
//! Three inbound stages inspect or transform the request before any adapter
//! is touched: the injection scanner, the PII masker, and the project
//! alignment checker. Three outbound stages validate what came back: the
//! schema enforcer, the tool-call grounder, and the hallucination scraper.
//! Each stage returns an [`InterceptOutcome`](crate::violation::InterceptOutcome);
//! the pipeline enforces ordering and short-circuiting.

pub mod alignment;
pub mod grounding;
pub mod hallucination;
pub mod injection;
pub mod pii;
pub mod schema;

use crate::items::{CanonicalRequest, Content, ContentBlock};

/// Collects every textual field of a request in document order: the system
/// prompt first, then each message's content, descending into nested blocks.
///
/// Both the injection scanner and the alignment checker's token estimate
/// walk the same surface, so the traversal lives here.
pub(crate) fn collect_texts(request: &CanonicalRequest) -> Vec<&str> {
    let mut texts = Vec::new();
    if let Some(system) = &request.system_prompt {
        texts.push(system.as_str());
    }
    for message in &request.messages {
        collect_content(&message.content, &mut texts);
    }
    texts
}

fn collect_content<'a>(content: &'a Content, texts: &mut Vec<&'a str>) {
    match content {
        Content::Text(text) => texts.push(text.as_str()),
        Content::Blocks(blocks) => {
            for block in blocks {
                collect_block(block, texts);
            }
        }
    }
}

fn collect_block<'a>(block: &'a ContentBlock, texts: &mut Vec<&'a str>) {
    if let Some(text) = &block.text {
        texts.push(text.as_str());
    }
    if let Some(nested) = &block.content {
        collect_content(nested, texts);
    }
}
