use log::debug;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::analysis::{completion, definition, document_symbols, hover, signature_help, Analyzer};
use crate::config::{find_workspace_root, ServerConfig};
use crate::document::{DocumentManager, StdFileReader};

pub struct Backend {
    pub client: Client,
    pub documents: DocumentManager,
    pub analyzer: RwLock<Analyzer>,
    cli_builtins: Vec<std::path::PathBuf>,
}

impl Backend {
    pub fn new(client: Client, builtin_stub_paths: Vec<std::path::PathBuf>) -> Self {
        Backend {
            client,
            documents: DocumentManager::new(Box::new(StdFileReader)),
            analyzer: RwLock::new(Analyzer::new(&builtin_stub_paths)),
            cli_builtins: builtin_stub_paths,
        }
    }

    async fn on_change(&self, uri: Url, text: String) {
        match self.documents.write(&uri, text.into_bytes()) {
            Ok((_, diagnostics)) => {
                self.client
                    .publish_diagnostics(uri, diagnostics, None)
                    .await;
            }
            Err(err) => {
                debug!("write({uri}) failed: {err}");
            }
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let config = ServerConfig::from_initialize_params(&params);
        let workspace_root = config
            .workspace_root
            .clone()
            .or_else(|| find_workspace_root(&params));
        self.documents.initialize(workspace_root);

        if !config.builtins.is_empty() {
            let mut paths = self.cli_builtins.clone();
            paths.extend(config.builtins);
            *self.analyzer.write().await = Analyzer::new(&paths);
        }

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "starlark-language-server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            offset_encoding: None,
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(true),
                        })),
                        ..Default::default()
                    },
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec![".".to_string()]),
                    work_done_progress_options: Default::default(),
                    all_commit_characters: None,
                    completion_item: None,
                }),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec!["(".to_string()]),
                    retrigger_characters: Some(vec![",".to_string(), "=".to_string()]),
                    work_done_progress_options: Default::default(),
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                definition_provider: Some(OneOf::Left(true)),
                ..ServerCapabilities::default()
            },
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        debug!("initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.on_change(params.text_document.uri, params.text_document.text)
            .await;
    }

    async fn did_change(&self, mut params: DidChangeTextDocumentParams) {
        if let Some(change) = params.content_changes.pop() {
            self.on_change(params.text_document.uri, change.text).await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        if let Some(text) = params.text {
            self.on_change(params.text_document.uri, text).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri);
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let pos = params.text_document_position.position.into();
        let Ok(doc) = self.documents.read(&uri) else {
            return Ok(Some(CompletionResponse::Array(vec![])));
        };
        let items = completion::completion(&*self.analyzer.read().await, &doc, pos);
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let uri = params.text_document_position_params.text_document.uri;
        let pos = params.text_document_position_params.position.into();
        let Ok(doc) = self.documents.read(&uri) else {
            return Ok(None);
        };
        Ok(signature_help::signature_help(&*self.analyzer.read().await, &doc, pos))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let pos = params.text_document_position_params.position.into();
        let Ok(doc) = self.documents.read(&uri) else {
            return Ok(None);
        };
        Ok(hover::hover(&*self.analyzer.read().await, &doc, pos))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let pos = params.text_document_position_params.position.into();
        let Ok(doc) = self.documents.read(&uri) else {
            return Ok(None);
        };
        let locations = definition::definition(&*self.analyzer.read().await, &doc, pos);
        Ok(match locations.len() {
            0 => None,
            1 => Some(GotoDefinitionResponse::Scalar(locations.into_iter().next().unwrap())),
            _ => Some(GotoDefinitionResponse::Array(locations)),
        })
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let Ok(doc) = self.documents.read(&uri) else {
            return Ok(None);
        };
        let symbols = document_symbols::document_symbols(&doc);
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}
