use std::{path::PathBuf, sync::Arc};

use tokio::sync::RwLock;
use tower_lsp::Client;

use crate::{
    definition::{
        CompilerInvocation, DefinitionIndex, DefinitionProvider, IndexSynchronizer, JaiCompiler, SnapshotSource,
        UnitCompiler,
    },
    document::DocumentStore,
    server::settings::ServerSettings,
};

/// Process-level inputs fixed before the LSP session starts.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Installation root; holds the definition extension under `src/` and,
    /// by default, the `defs.out` snapshot.
    pub install_dir: PathBuf,
    /// Defaults layered with command-line flags.
    pub settings: ServerSettings,
}

impl LaunchOptions {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            settings: ServerSettings::default(),
        }
    }

    pub fn with_settings(
        mut self,
        settings: ServerSettings,
    ) -> Self {
        self.settings = settings;
        self
    }
}

/// The jai-analyzer backend that implements the Language Server Protocol.
pub struct JaiLanguageServer {
    /// The LSP client handle, used to send notifications back.
    pub(crate) client: Client,

    /// Thread-safe store of all open documents.
    pub(crate) document_store: Arc<DocumentStore>,

    /// Runs the Jai compiler with the definition extension.
    pub(crate) compiler: Arc<JaiCompiler>,

    /// Provides go-to-definition from the compiler's `defs.out` snapshot.
    pub(crate) definition_provider: Arc<DefinitionProvider>,

    /// Workspace root folders, populated during `initialize`.
    pub(crate) workspace_roots: RwLock<Vec<PathBuf>>,

    pub(crate) install_dir: PathBuf,

    /// Settings from the command line. Project config and editor payloads
    /// are layered on top of these during `initialize`.
    pub(crate) launch_settings: ServerSettings,

    /// Runtime server settings updated from LSP configuration.
    pub(crate) settings: Arc<RwLock<ServerSettings>>,
}

impl JaiLanguageServer {
    /// Create a new `JaiLanguageServer` wired to the given LSP client.
    pub fn new(
        client: Client,
        options: LaunchOptions,
    ) -> Self {
        let LaunchOptions {
            install_dir,
            settings,
        } = options;

        let compiler = Arc::new(JaiCompiler::new(CompilerInvocation::new(&install_dir)));
        let synchronizer = Arc::new(IndexSynchronizer::new(
            Arc::new(DefinitionIndex::new()),
            Arc::clone(&compiler) as Arc<dyn UnitCompiler>,
            SnapshotSource::new(settings.indexing.snapshot_location, &install_dir),
        ));
        let definition_provider = Arc::new(DefinitionProvider::new(synchronizer));

        let server = Self {
            client,
            document_store: Arc::new(DocumentStore::new()),
            compiler,
            definition_provider,
            workspace_roots: RwLock::new(Vec::new()),
            install_dir,
            launch_settings: settings.clone(),
            settings: Arc::new(RwLock::new(settings.clone())),
        };
        server.configure_components(&settings);
        server
    }

    pub fn definition_provider(&self) -> &Arc<DefinitionProvider> {
        &self.definition_provider
    }

    pub(crate) async fn settings_snapshot(&self) -> ServerSettings {
        self.settings.read().await.clone()
    }

    pub(crate) async fn apply_settings(
        &self,
        settings: ServerSettings,
    ) {
        self.configure_components(&settings);
        *self.settings.write().await = settings;
    }

    pub(crate) async fn primary_workspace_root(&self) -> Option<PathBuf> {
        self.workspace_roots.read().await.first().cloned()
    }

    fn configure_components(
        &self,
        settings: &ServerSettings,
    ) {
        self.compiler.configure(CompilerInvocation {
            executable: settings.compiler.path.clone(),
            install_dir: self.install_dir.clone(),
            build_args: settings.compiler.build_args.clone(),
            timeout: settings.compiler.timeout(),
        });

        let synchronizer = self.definition_provider.synchronizer();
        synchronizer.set_snapshot_source(SnapshotSource::new(settings.indexing.snapshot_location, &self.install_dir));

        // Misses recorded under the old compiler settings may resolve now.
        self.definition_provider.forget_absent();
    }
}
