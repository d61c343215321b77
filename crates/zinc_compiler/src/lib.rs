//! zinc_compiler: Compiler orchestration.
//!
//! A `Session` owns the identifier table and the options for one
//! compilation. It binds every module, refuses to go further when any
//! error was reported, and then verifies each module's bound output in
//! parallel before handing it to lowering.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};
use zinc_binder::{Binder, BinderOptions, Decl, NodeId, NodeKind, Program, SymbolId};
use zinc_core::{FileId, IdentTable, SyntaxArena};
use zinc_diagnostics::DiagnosticCollection;
use zinc_options::{CompilerOptions, ConfigError};
use zinc_syntax::json::{load_module, LoadError};
use zinc_syntax::ModuleSyntax;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: LoadError,
    },
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("module `{module}` hands {what} `{name}` to lowering")]
    Verification {
        module: String,
        what: &'static str,
        name: String,
    },
}

/// What lowering learns about one bound module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSummary {
    pub name: String,
    pub entry: SymbolId,
    /// Top-level statements in the entry function.
    pub statements: usize,
    /// Functions reachable from the entry, the entry included.
    pub functions: usize,
    /// Bound nodes reachable from the entry.
    pub nodes: usize,
}

/// The result of binding a whole program.
pub struct Compilation<'a> {
    pub program: Program<'a>,
    pub diagnostics: DiagnosticCollection,
    /// Empty when binding reported errors.
    pub summaries: Vec<ModuleSummary>,
}

impl Compilation<'_> {
    pub fn succeeded(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

pub struct Session {
    options: CompilerOptions,
    idents: IdentTable,
}

impl Session {
    pub fn new(options: CompilerOptions) -> Result<Self, CompileError> {
        options.validate()?;
        Ok(Self {
            options,
            idents: IdentTable::init(),
        })
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// The identifier table syntax trees for this session must be built
    /// against.
    pub fn idents(&self) -> &IdentTable {
        &self.idents
    }

    pub fn binder_options(&self) -> BinderOptions {
        BinderOptions {
            pointer_width: self.options.pointer_width(),
            max_nesting_depth: self.options.max_nesting_depth(),
            entry_name: self.options.entry_name().to_string(),
            max_errors: self.options.max_errors,
        }
    }

    /// Load syntax dumps into `arena`, one module per file.
    pub fn load_modules<'a>(
        &self,
        arena: &'a SyntaxArena,
        paths: &[PathBuf],
    ) -> Result<Vec<&'a ModuleSyntax<'a>>, CompileError> {
        paths
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let text = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
                    path: path.clone(),
                    source,
                })?;
                self.load_source(arena, FileId(index as u32), path, &text)
            })
            .collect()
    }

    pub fn load_source<'a>(
        &self,
        arena: &'a SyntaxArena,
        file: FileId,
        path: &Path,
        text: &str,
    ) -> Result<&'a ModuleSyntax<'a>, CompileError> {
        load_module(arena, &self.idents, file, text).map_err(|source| CompileError::Load {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Bind every module, then verify the output unless an error was
    /// reported.
    pub fn compile<'a>(&self, modules: &[&'a ModuleSyntax<'a>]) -> Result<Compilation<'a>, CompileError> {
        let mut binder = Binder::new(&self.idents, self.binder_options());
        binder.bind_program(modules);
        let (program, mut diagnostics) = binder.finish();
        diagnostics.sort();

        if diagnostics.has_errors() {
            info!(errors = diagnostics.error_count(), "binding failed, skipping later stages");
            return Ok(Compilation {
                program,
                diagnostics,
                summaries: Vec::new(),
            });
        }
        let summaries = self.verify(&program)?;
        info!(modules = summaries.len(), "binding finished");
        Ok(Compilation {
            program,
            diagnostics,
            summaries,
        })
    }

    /// Check each module's reachable output in parallel: no template or
    /// alias may be referenced by a bound node.
    pub fn verify(&self, program: &Program<'_>) -> Result<Vec<ModuleSummary>, CompileError> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = self.options.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;
        pool.install(|| {
            program
                .modules
                .par_iter()
                .map(|module| self.verify_module(program, *module))
                .collect()
        })
    }

    fn verify_module(&self, program: &Program<'_>, module: SymbolId) -> Result<ModuleSummary, CompileError> {
        let name = self.idents.resolve(program.symbol(module).name).to_string();
        let Decl::Module(decl) = &program.symbol(module).decl else {
            return Err(CompileError::Verification {
                module: name.clone(),
                what: "a non-module",
                name,
            });
        };
        let Some(entry) = decl.entry else {
            return Err(CompileError::Verification {
                module: name,
                what: "an unbound module",
                name: String::new(),
            });
        };
        let body: Vec<NodeId> = program.function(entry).map(|f| f.body.clone()).unwrap_or_default();

        let mut nodes = 0;
        let mut functions = vec![entry];
        let mut failure = None;
        program.walk(&body, |_, node| {
            nodes += 1;
            if let NodeKind::Call { function, .. } = node.kind {
                if !functions.contains(&function) {
                    functions.push(function);
                }
            }
            for symbol in node.kind.symbols() {
                let what = match &program.symbol(symbol).decl {
                    Decl::Template(_) | Decl::OverloadSet(_) => "template",
                    decl if decl.is_alias() => "alias",
                    _ => continue,
                };
                failure.get_or_insert((what, symbol));
            }
        });
        if let Some((what, symbol)) = failure {
            return Err(CompileError::Verification {
                module: name,
                what,
                name: self.idents.resolve(program.symbol(symbol).name).to_string(),
            });
        }

        debug!(module = %name, nodes, functions = functions.len(), "verified module");
        Ok(ModuleSummary {
            name,
            entry,
            statements: body.len(),
            functions: functions.len(),
            nodes,
        })
    }

    /// Release the identifier table. Returns how many identifiers it held.
    pub fn finish(self) -> usize {
        let count = self.idents.teardown();
        debug!(identifiers = count, "session finished");
        count
    }
}
