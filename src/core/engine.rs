// src/core/engine.rs
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use tracing::{info, warn, debug};

use crate::config::{Config, OutputFormat};
use super::{
    CallGraphExtractor, CodeParser, ExtractionOptions, ExtractionResult, FsSourceStore,
    ModuleIndex, SequenceDiagramRenderer, SourceStore,
};

/// Main orchestration engine: index, extract, render, persist
pub struct Engine {
    config: Config,
    parser: CodeParser,
    store: Box<dyn SourceStore>,
    renderer: SequenceDiagramRenderer,
}

impl Engine {
    /// Create a new engine instance from a config file (or the defaults)
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;

        debug!("Loaded configuration: {:?}", config);

        Self::with_config(config, Box::new(FsSourceStore))
    }

    pub fn with_config(config: Config, store: Box<dyn SourceStore>) -> Result<Self> {
        let parser = CodeParser::new(&config.parsing)?;

        Ok(Self {
            config,
            parser,
            store,
            renderer: SequenceDiagramRenderer::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generate the diagram for `function` in `source` and write it out.
    /// Returns the path of the written artifact.
    pub async fn generate(
        &mut self,
        source: &Path,
        function: &str,
        output: Option<PathBuf>,
        format: Option<OutputFormat>,
    ) -> Result<PathBuf> {
        let format = format.unwrap_or(self.config.output.format);

        info!("🔍 Analyzing {} in {}", function, source.display());
        let index = self.build_index();
        let result = self.analyze(&index, source, function)?;

        info!("🔗 {} calls discovered from {}.{}", result.calls.len(), result.entry_module, function);

        let content = self.render(&result, format)?;
        let output_path = output.unwrap_or_else(|| self.default_output_path(&result, function, format));
        self.write_artifact(&output_path, &content).await?;

        info!("📝 Diagram written to {}", output_path.display());
        Ok(output_path)
    }

    /// Build the module index from the configured source locations
    pub fn build_index(&mut self) -> ModuleIndex {
        let index = ModuleIndex::build(
            &mut self.parser,
            self.store.as_ref(),
            &self.config.project.source_locations,
        );

        for diagnostic in index.diagnostics() {
            debug!("Index diagnostic for {}: {}", diagnostic.path.display(), diagnostic.reason);
        }
        if index.is_empty() {
            warn!(
                "No modules indexed from {:?}; calls will not be expanded",
                self.config.project.source_locations
            );
        }

        index
    }

    /// Extract the call sequence of `function` using a prebuilt index
    pub fn analyze(&mut self, index: &ModuleIndex, source: &Path, function: &str) -> Result<ExtractionResult> {
        let options = ExtractionOptions::from(&self.config.extraction);
        let extractor = CallGraphExtractor::new(index, options);

        extractor
            .extract(&mut self.parser, self.store.as_ref(), source, function)
            .with_context(|| format!("Failed to analyze {}", source.display()))
    }

    pub fn render(&self, result: &ExtractionResult, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Mermaid => Ok(self.renderer.render_result(result).to_string()),
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(result)?;
                json.push('\n');
                Ok(json)
            }
        }
    }

    /// Print every indexed module and its functions
    pub async fn index(&mut self, json: bool) -> Result<()> {
        let index = self.build_index();

        if json {
            let modules: Vec<serde_json::Value> = index
                .module_names()
                .map(|module| serde_json::json!({
                    "module": module,
                    "functions": index.functions(module),
                }))
                .collect();
            let listing = serde_json::json!({
                "modules": modules,
                "diagnostics": index.diagnostics(),
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
            return Ok(());
        }

        for module in index.module_names() {
            println!("{}", module);
            for function in index.functions(module) {
                println!("  {}", function);
            }
        }
        for diagnostic in index.diagnostics() {
            println!("skipped {}: {}", diagnostic.path.display(), diagnostic.reason);
        }
        Ok(())
    }

    /// Write a default configuration file
    pub async fn init(&self, path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
        let dir = path.unwrap_or_else(|| PathBuf::from("."));
        let config_path = dir.join("calltrail.toml");

        if config_path.exists() && !force {
            anyhow::bail!("{} already exists (use --force to overwrite)", config_path.display());
        }

        tokio::fs::create_dir_all(&dir).await?;
        Config::default().save(&config_path)?;
        info!("✅ Wrote {}", config_path.display());
        Ok(config_path)
    }

    /// Persist an artifact, creating parent directories as needed
    pub async fn write_artifact(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn default_output_path(&self, result: &ExtractionResult, function: &str, format: OutputFormat) -> PathBuf {
        self.config.project.output_dir.join(format!(
            "{}.{}.{}",
            result.entry_module,
            function,
            format.extension()
        ))
    }
}
