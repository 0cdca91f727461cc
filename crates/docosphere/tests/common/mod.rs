//! Deterministic in-process providers and document builders shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use docosphere::config::RagConfig;
use docosphere::providers::{CompletionRequest, EmbeddingProvider, LlmProvider, Providers};
use docosphere::server::AppState;
use docosphere::Result;

pub const DIMENSIONS: usize = 64;

/// Bag-of-words embedder hashing lowercase tokens into a fixed number of buckets
#[derive(Default)]
pub struct HashEmbedder {
    queries: Mutex<Vec<String>>,
    documents: Mutex<usize>,
}

impl HashEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            // FNV-1a
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            v[(hash % DIMENSIONS as u64) as usize] += 1.0;
        }
        v
    }

    /// Query texts embedded so far
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    /// Document texts embedded so far
    pub fn documents_embedded(&self) -> usize {
        *self.documents.lock()
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.queries.lock().push(text.to_string());
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        *self.documents.lock() += texts.len();
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash"
    }

    fn model(&self) -> &str {
        "hash-bow-64"
    }
}

/// Model double: answers known questions directly, asks for retrieval otherwise,
/// and echoes the context when asked a grounded question
#[derive(Default)]
pub struct ScriptedLlm {
    direct: HashMap<String, String>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `question` directly during assessment
    pub fn knows(mut self, question: &str, answer: &str) -> Self {
        self.direct.insert(question.to_string(), answer.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> &'a str {
    let from = prompt.find(start).map(|i| i + start.len()).unwrap_or(0);
    let rest = &prompt[from..];
    let to = rest.find(end).unwrap_or(rest.len());
    rest[..to].trim()
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.lock().push(request.clone());
        let prompt = request.prompt.as_str();

        if prompt.contains("Context:\n") {
            let context = section(prompt, "Context:\n", "\n\nQuestion:");
            return Ok(format!("According to the documents: {}", context));
        }

        let question = section(prompt, "Question: ", "\n");
        let reply = match (self.direct.get(question), request.json_response) {
            (Some(answer), true) => {
                serde_json::json!({ "decision": "answer", "answer": answer }).to_string()
            }
            (Some(answer), false) => answer.clone(),
            (None, true) => r#"{"decision": "need_retrieval", "answer": ""}"#.to_string(),
            (None, false) => " NEED_RETRIEVAL\n".to_string(),
        };
        Ok(reply)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }
}

/// Small chunks so multi-paragraph documents span several of them
pub fn config(dir: &Path) -> RagConfig {
    let mut config = RagConfig::default();
    config.index.path = dir.join("doc_index");
    config.chunking.chunk_size = 200;
    config.chunking.chunk_overlap = 20;
    config.embeddings.dimensions = DIMENSIONS;
    config
}

pub struct Harness {
    pub state: AppState,
    pub embedder: Arc<HashEmbedder>,
    pub llm: Arc<ScriptedLlm>,
}

pub fn harness(config: RagConfig, llm: ScriptedLlm) -> Harness {
    let embedder = Arc::new(HashEmbedder::default());
    let llm = Arc::new(llm);
    let providers = Providers {
        embedder: embedder.clone(),
        llm: llm.clone(),
    };
    let state = AppState::with_providers(config, providers).unwrap();
    Harness {
        state,
        embedder,
        llm,
    }
}

/// Build a PDF with one page of text per entry
pub fn pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Build a DOCX with one paragraph per entry
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    use docx_rs::{Docx, Paragraph, Run};

    let mut docx = Docx::new();
    for text in paragraphs {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
    }

    let mut cursor = std::io::Cursor::new(Vec::new());
    docx.build().pack(&mut cursor).unwrap();
    cursor.into_inner()
}
