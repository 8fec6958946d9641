use std::{panic::AssertUnwindSafe, path::PathBuf, sync::Arc, time::Instant};

use futures::FutureExt;
use tower_lsp::{
    Client, LanguageServer,
    jsonrpc::{Error, Result},
    lsp_types::*,
};
use tracing::{debug, info, warn};

use crate::{
    definition::{CompilationUnit, DefinitionProvider, NormalizedPath, SyncOutcome, normalize_fs_path},
    ide::lsp::{ide_location_to_definition, lsp_position_to_ide},
    progress::ProgressToken,
    server::{project_config::apply_project_config, state::JaiLanguageServer},
};

const CLIENT_NOTIFICATION_PREFIX: &str = "jai-analyzer:";

#[tower_lsp::async_trait]
impl LanguageServer for JaiLanguageServer {
    async fn initialize(
        &self,
        params: InitializeParams,
    ) -> Result<InitializeResult> {
        info!("Initializing jai-analyzer...");

        let roots = workspace_roots(&params);
        let mut settings = self.launch_settings.clone();
        if let Some(root) = roots.first() {
            settings = apply_project_config(&settings, root).map_err(|error| Error::invalid_params(error.to_string()))?;
        }
        if let Some(options) = params.initialization_options.as_ref() {
            settings = settings.merged_with_payload(options).map_err(|error| Error::invalid_params(error.to_string()))?;
        }
        self.apply_settings(settings).await;
        *self.workspace_roots.write().await = roots;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::INCREMENTAL),
                    save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                    ..Default::default()
                })),
                definition_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "jai-analyzer".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(
        &self,
        _: InitializedParams,
    ) {
        info!("jai-analyzer initialized");

        let settings = self.settings_snapshot().await;
        let root = self.primary_workspace_root().await;
        let build_file = settings.compiler.resolved_build_file(root.as_deref());
        let provider = Arc::clone(&self.definition_provider);
        let client = self.client.clone();

        // Serve whatever the last run left behind, then rebuild from the
        // build file if there is one.
        tokio::spawn(async move {
            if let SyncOutcome::Updated {
                entries, ..
            } = provider.synchronizer().load_existing().await
            {
                info!("Loaded {entries} definitions from an existing snapshot");
            }

            let Some(build_file) = build_file else {
                debug!("No build file configured, indexing on demand");
                return;
            };
            let progress =
                ProgressToken::begin(&client, "Indexing", Some(format!("Compiling {}", build_file.file_name()))).await;
            let outcome = provider.synchronizer().sync(CompilationUnit::file(build_file)).await;
            progress.end(Some(describe_outcome(&outcome))).await;

            if let SyncOutcome::Failed(error) = outcome {
                let _ = AssertUnwindSafe(
                    client.show_message(
                        MessageType::WARNING,
                        prefixed_client_message(format!("Initial indexing failed: {error}")),
                    ),
                )
                .catch_unwind()
                .await;
            }
        });
    }

    async fn did_change_configuration(
        &self,
        params: DidChangeConfigurationParams,
    ) {
        let current = self.settings_snapshot().await;
        let merged = match current.merged_with_payload(&params.settings) {
            Ok(merged) => merged,
            Err(error) => {
                warn!("Ignoring settings update: {error}");
                let _ = AssertUnwindSafe(self.client.show_message(
                    MessageType::ERROR,
                    prefixed_client_message(format!("Settings not applied: {error}")),
                ))
                .catch_unwind()
                .await;
                return;
            },
        };
        if merged == current {
            return;
        }

        self.apply_settings(merged).await;
        info!("Applied updated jai-analyzer settings");
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down jai-analyzer");
        self.definition_provider.log_perf_summary();
        let _ = AssertUnwindSafe(self.client.show_message(
            MessageType::WARNING,
            prefixed_client_message("Shutting down. Language features will be unavailable until the server restarts."),
        ))
        .catch_unwind()
        .await;
        Ok(())
    }

    async fn did_open(
        &self,
        params: DidOpenTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        let version = params.text_document.version;
        let filename = short_name(&uri);
        let settings = self.settings_snapshot().await;

        info!("Opened {filename} (v{version}, {} bytes)", text.len());
        if settings.logging.level.allows_info() {
            let _ = AssertUnwindSafe(
                self.client.log_message(MessageType::INFO, prefixed_client_message(format!("Opened {filename}"))),
            )
            .catch_unwind()
            .await;
        }

        self.document_store.open(uri.clone(), text, version);

        if !settings.indexing.on_open {
            return;
        }
        let Some(path) = file_path(&uri) else {
            return;
        };
        let provider = Arc::clone(&self.definition_provider);
        tokio::spawn(async move {
            if let Some(outcome) = provider.prime(&path).await {
                debug!("Indexed on open {filename}: {}", describe_outcome(&outcome));
            }
        });
    }

    async fn did_change(
        &self,
        params: DidChangeTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        self.document_store.apply_changes(&uri, params.content_changes, version);
    }

    async fn did_save(
        &self,
        params: DidSaveTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        if let Some(text) = params.text {
            let version = self.document_store.get(&uri).map_or(0, |doc| doc.version);
            self.document_store.update(uri.clone(), text, version);
        }

        if !self.settings_snapshot().await.indexing.on_save {
            return;
        }
        let Some(path) = file_path(&uri) else {
            return;
        };
        let filename = short_name(&uri);
        let provider = Arc::clone(&self.definition_provider);
        let client = self.client.clone();
        tokio::spawn(async move {
            refresh_after_save(&client, &provider, &path, &filename).await;
        });
    }

    async fn did_close(
        &self,
        params: DidCloseTextDocumentParams,
    ) {
        self.document_store.close(&params.text_document.uri);
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(path) = file_path(&uri) else {
            return Ok(None);
        };

        // Keys name the first character of the reference, not the cursor.
        // Without the text, the cursor is the best guess.
        let word_start = if self.document_store.contains(&uri) {
            match self.document_store.identifier_start(&uri, position) {
                Some(start) => start,
                None => {
                    debug!("goto-def {}:{}:{} → no identifier", short_name(&uri), position.line + 1, position.character + 1);
                    return Ok(None);
                },
            }
        } else {
            position
        };

        let progress = ProgressToken::begin(&self.client, "Definition", Some("Finding definition…".to_string())).await;
        let start = Instant::now();
        let target = self.definition_provider.provide(&path, lsp_position_to_ide(word_start)).await;
        let elapsed = start.elapsed();

        let filename = short_name(&uri);
        let lsp_result = target.and_then(ide_location_to_definition);
        match &lsp_result {
            Some(GotoDefinitionResponse::Scalar(location)) => {
                let target = format!("{}:{}", short_path(location.uri.path()), location.range.start.line + 1);
                debug!("goto-def {filename}:{}:{} → {target} ({elapsed:?})", position.line + 1, position.character + 1);
                progress.end(Some(format!("Resolved definition: {target}"))).await;
            },
            Some(_) => {
                progress.end(Some("Resolved definition".to_string())).await;
            },
            None => {
                debug!("goto-def {filename}:{}:{} → none ({elapsed:?})", position.line + 1, position.character + 1);
                progress.end(Some("No definition found".to_string())).await;
            },
        }
        Ok(lsp_result)
    }
}

async fn refresh_after_save(
    client: &Client,
    provider: &DefinitionProvider,
    path: &NormalizedPath,
    filename: &str,
) {
    let Some(outcome) = provider.refresh(path).await else {
        return;
    };
    debug!("Reindexed after saving {filename}: {}", describe_outcome(&outcome));
    if let SyncOutcome::Failed(error) = outcome {
        let _ = AssertUnwindSafe(
            client.log_message(MessageType::WARNING, prefixed_client_message(format!("Reindexing failed: {error}"))),
        )
        .catch_unwind()
        .await;
    }
}

fn workspace_roots(params: &InitializeParams) -> Vec<PathBuf> {
    if let Some(folders) = params.workspace_folders.as_ref() {
        return folders.iter().filter_map(|folder| folder.uri.to_file_path().ok()).collect();
    }
    #[allow(deprecated)]
    let root_uri = params.root_uri.as_ref();
    root_uri.and_then(|uri| uri.to_file_path().ok()).into_iter().collect()
}

fn file_path(uri: &Url) -> Option<NormalizedPath> {
    uri.to_file_path().ok().map(|path| normalize_fs_path(&path))
}

fn describe_outcome(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Updated {
            entries, ..
        } => format!("Indexed {entries} definitions"),
        SyncOutcome::Failed(error) => format!("Indexing failed: {error}"),
    }
}

fn short_name(uri: &Url) -> String {
    uri.path().rsplit('/').next().unwrap_or(uri.path()).to_owned()
}

fn short_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn prefixed_client_message(message: impl AsRef<str>) -> String {
    format!("{CLIENT_NOTIFICATION_PREFIX} {}", message.as_ref())
}

#[cfg(test)]
#[path = "../../tests/src/server/handler_tests.rs"]
mod tests;
