// ⚙️ Pipeline Orchestrator - read → normalize → join → derive → summarize
//
// `ClaimsPipeline` is the only stateful piece: it holds at most one
// Enriched Table, overwritten by every `process` call. Create one pipeline
// per request; never share one across concurrent callers.

use crate::deadline::{Clock, SystemClock};
use crate::enriched::EnrichedTable;
use crate::error::{ClaimsError, Result};
use crate::join::join;
use crate::normalize::{read_source, read_source_file, SourceKind, SourceTable};
use crate::summary::{summarize, RiskSummary};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// SOURCES
// ============================================================================

/// Where one report's CSV bytes come from.
#[derive(Debug, Clone)]
pub enum SourceInput {
    Path(PathBuf),
    /// In-memory upload; `name` is only used in error messages and logs.
    Bytes { name: String, data: Vec<u8> },
}

impl SourceInput {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        SourceInput::Path(path.into())
    }

    pub fn bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        SourceInput::Bytes {
            name: name.into(),
            data,
        }
    }

    pub fn label(&self) -> String {
        match self {
            SourceInput::Path(p) => p.display().to_string(),
            SourceInput::Bytes { name, .. } => name.clone(),
        }
    }

    fn read(&self, kind: SourceKind) -> Result<SourceTable> {
        match self {
            SourceInput::Path(path) => read_source_file(kind, path),
            SourceInput::Bytes { data, .. } => read_source(kind, data.as_slice()),
        }
    }
}

/// The three ACE reports. Entry summary and liquidation status are required.
#[derive(Debug, Clone, Default)]
pub struct ReportSources {
    pub entry_summary: Option<SourceInput>,
    pub liquidation_status: Option<SourceInput>,
    pub importer_statement: Option<SourceInput>,
}

impl ReportSources {
    pub fn new(entry_summary: SourceInput, liquidation_status: SourceInput) -> Self {
        ReportSources {
            entry_summary: Some(entry_summary),
            liquidation_status: Some(liquidation_status),
            importer_statement: None,
        }
    }

    pub fn from_paths(
        entry_summary: &Path,
        liquidation_status: &Path,
        importer_statement: Option<&Path>,
    ) -> Self {
        ReportSources {
            entry_summary: Some(SourceInput::path(entry_summary)),
            liquidation_status: Some(SourceInput::path(liquidation_status)),
            importer_statement: importer_statement.map(SourceInput::path),
        }
    }

    pub fn with_importer_statement(mut self, importer_statement: SourceInput) -> Self {
        self.importer_statement = Some(importer_statement);
        self
    }

    fn required(input: &Option<SourceInput>, kind: SourceKind) -> Result<&SourceInput> {
        input
            .as_ref()
            .ok_or_else(|| ClaimsError::MissingSource(kind.name().to_string()))
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct ClaimsPipeline {
    clock: Box<dyn Clock>,
    result: Option<EnrichedTable>,
}

impl Default for ClaimsPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimsPipeline {
    /// Pipeline that measures `days_remaining` against the local wall clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Pipeline with an injected clock, for reproducible runs.
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        ClaimsPipeline {
            clock: Box::new(clock),
            result: None,
        }
    }

    /// Run the full pipeline and retain the result.
    ///
    /// Any failure aborts the whole run and leaves the result slot empty.
    pub fn process(&mut self, sources: &ReportSources) -> Result<&EnrichedTable> {
        self.result = None;

        let table = self.build(sources)?;
        info!(
            entries = table.len(),
            as_of = %table.as_of,
            "processed ACE reports"
        );

        let retained = self.result.insert(table);
        Ok(&*retained)
    }

    /// Convenience wrapper over `process` for files on disk.
    pub fn process_files(
        &mut self,
        entry_summary: &Path,
        liquidation_status: &Path,
        importer_statement: Option<&Path>,
    ) -> Result<&EnrichedTable> {
        let sources = ReportSources::from_paths(entry_summary, liquidation_status, importer_statement);
        self.process(&sources)
    }

    fn build(&self, sources: &ReportSources) -> Result<EnrichedTable> {
        let entry_input = ReportSources::required(&sources.entry_summary, SourceKind::EntrySummary)?;
        let liq_input =
            ReportSources::required(&sources.liquidation_status, SourceKind::LiquidationStatus)?;

        // "now" is pinned once so every row shares the same reference date
        let today = self.clock.today();

        let primary = load(entry_input, SourceKind::EntrySummary)?;
        let mut secondaries = vec![load(liq_input, SourceKind::LiquidationStatus)?];
        if let Some(importer) = &sources.importer_statement {
            secondaries.push(load(importer, SourceKind::ImporterStatement)?);
        }

        let joined = join(primary, &secondaries);
        Ok(EnrichedTable::from_joined(joined, today))
    }

    /// Last processed table, if any.
    pub fn result(&self) -> Option<&EnrichedTable> {
        self.result.as_ref()
    }

    fn retained(&self) -> Result<&EnrichedTable> {
        self.result.as_ref().ok_or(ClaimsError::Unprocessed)
    }

    /// Risk summary of the retained table.
    pub fn summary(&self) -> Result<RiskSummary> {
        Ok(summarize(self.retained()?))
    }

    /// Export the retained table to a CSV file.
    pub fn export(&self, destination: &Path) -> Result<()> {
        let table = self.retained()?;
        let file = File::create(destination)?;
        table.write_csv(BufWriter::new(file))?;
        info!(rows = table.len(), path = %destination.display(), "exported results");
        Ok(())
    }

    pub fn export_to_writer<W: Write>(&self, writer: W) -> Result<()> {
        self.retained()?.write_csv(writer)
    }
}

fn load(input: &SourceInput, kind: SourceKind) -> Result<SourceTable> {
    let table = input.read(kind)?;
    debug!(source = kind.name(), input = %input.label(), rows = table.len(), "loaded source");
    Ok(table)
}
