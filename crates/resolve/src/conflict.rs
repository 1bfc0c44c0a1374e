//! Interactive resolution of version conflicts
//!
//! Every conflicted group runs through a small state machine:
//!
//! ```text
//! Selecting --pick--> ConfirmingCascade --Yes/No/Continue--> Committed
//!     ^                      |
//!     +------ Go back -------+
//! ```
//!
//! [`transition`] is pure; [`ConflictResolver`] asks the [`Prompter`] for
//! each answer and applies committed selections.

use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;

use crate::errors::{ResolveError, ResolveResult, ResolveWarning};
use crate::grouper::ModuleGroup;
use crate::module::{Origin, ResolvedModule};

pub const ALL: &str = "All";
pub const YES: &str = "Yes";
pub const NO: &str = "No";
pub const GO_BACK: &str = "Go back";
pub const CONTINUE: &str = "Continue";

/// Asks the user to pick exactly one of `choices`
pub trait Prompter {
    fn select(&mut self, question: &str, choices: &[String]) -> ResolveResult<String>;
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn select(&mut self, question: &str, choices: &[String]) -> ResolveResult<String> {
        (**self).select(question, choices)
    }
}

impl<P: Prompter + ?Sized> Prompter for Box<P> {
    fn select(&mut self, question: &str, choices: &[String]) -> ResolveResult<String> {
        (**self).select(question, choices)
    }
}

/// Persistent "always ignore" list
pub trait IgnoreStore {
    fn load_ignored(&self) -> ResolveResult<Vec<String>>;
    fn persist_ignored(&mut self, names: &[String]) -> ResolveResult<()>;
}

/// Versions picked for a group and the ones left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub selected: Vec<String>,
    pub unselected: Vec<String>,
}

/// What happens to modules depending on an unselected version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cascade {
    /// Nothing depended on the unselected versions
    None,
    /// Ignore the dependents too
    Discard(Vec<String>),
    /// Keep the dependents despite the missing dependency
    Keep(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictState {
    Selecting,
    ConfirmingCascade {
        selection: Selection,
        dependents: Vec<String>,
    },
    Committed {
        selection: Selection,
        cascade: Cascade,
    },
}

/// The view of the run a single group's transitions need
#[derive(Debug)]
pub struct GroupContext<'a> {
    pub group: &'a ModuleGroup,
    /// Package names still eligible in this group
    pub members: Vec<String>,
    pub loaded: &'a [ResolvedModule],
    pub ignore: &'a IndexSet<String>,
}

impl GroupContext<'_> {
    /// Loaded, non-ignored modules declaring a dependency on any of `unselected`
    pub fn dependents(&self, unselected: &[String]) -> Vec<String> {
        self.loaded
            .iter()
            .map(|m| &m.module)
            .filter(|m| {
                !self.ignore.contains(&m.package_name) && !unselected.contains(&m.package_name)
            })
            .filter(|m| unselected.iter().any(|dep| m.depends_on(dep)))
            .map(|m| m.package_name.clone())
            .collect()
    }
}

impl ConflictState {
    /// Question and choices to present, `None` once committed
    pub fn prompt(&self, cx: &GroupContext<'_>) -> Option<(String, Vec<String>)> {
        match self {
            ConflictState::Selecting => {
                let mut choices = vec![ALL.to_string()];
                choices.extend(cx.members.iter().cloned());
                Some((
                    format!(
                        "Multiple versions of `{}` found, which should be used?",
                        cx.group.namespace
                    ),
                    choices,
                ))
            }
            ConflictState::ConfirmingCascade {
                selection,
                dependents,
            } if dependents.is_empty() => Some((
                format!("Use {}?", selection.selected.join(", ")),
                vec![CONTINUE.to_string(), GO_BACK.to_string()],
            )),
            ConflictState::ConfirmingCascade {
                selection,
                dependents,
            } => Some((
                format!(
                    "{} depend on {}, which will be ignored. Ignore them as well?",
                    dependents.join(", "),
                    selection.unselected.join(", ")
                ),
                vec![YES.to_string(), NO.to_string(), GO_BACK.to_string()],
            )),
            ConflictState::Committed { .. } => None,
        }
    }
}

/// Advance `state` by one answer
pub fn transition(
    state: ConflictState,
    answer: &str,
    cx: &GroupContext<'_>,
) -> ResolveResult<ConflictState> {
    let Some((question, choices)) = state.prompt(cx) else {
        return Ok(state);
    };
    if !choices.iter().any(|choice| choice == answer) {
        return Err(ResolveError::invalid_answer(&question, answer, &choices));
    }

    let next = match state {
        ConflictState::Selecting => {
            let selection = if answer == ALL {
                Selection {
                    selected: choices.into_iter().filter(|c| c != ALL).collect(),
                    unselected: Vec::new(),
                }
            } else {
                Selection {
                    selected: vec![answer.to_string()],
                    unselected: cx.members.iter().filter(|m| *m != answer).cloned().collect(),
                }
            };
            let dependents = cx.dependents(&selection.unselected);
            ConflictState::ConfirmingCascade {
                selection,
                dependents,
            }
        }
        ConflictState::ConfirmingCascade {
            selection,
            dependents,
        } => match answer {
            GO_BACK => ConflictState::Selecting,
            YES => ConflictState::Committed {
                selection,
                cascade: Cascade::Discard(dependents),
            },
            NO => ConflictState::Committed {
                selection,
                cascade: Cascade::Keep(dependents),
            },
            _ => ConflictState::Committed {
                selection,
                cascade: Cascade::None,
            },
        },
        committed @ ConflictState::Committed { .. } => committed,
    };
    Ok(next)
}

/// Modules kept and package names discarded by a resolution
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub keep: Vec<ResolvedModule>,
    pub ignore: Vec<String>,
    pub warnings: Vec<ResolveWarning>,
}

pub struct ConflictResolver<P> {
    prompter: P,
}

impl<P: Prompter> ConflictResolver<P> {
    pub fn new(prompter: P) -> Self {
        Self { prompter }
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Decide which versions of every group are kept
    pub fn resolve(
        &mut self,
        grouped: &IndexMap<String, ModuleGroup>,
        loaded: &[ResolvedModule],
        ignore: &[String],
        store: Option<&mut dyn IgnoreStore>,
    ) -> ResolveResult<Resolution> {
        // Ignored names the registry still had to load as dependencies stay kept
        let mut running_ignore: IndexSet<String> = ignore
            .iter()
            .filter(|name| {
                !loaded
                    .iter()
                    .any(|m| m.origin == Origin::Transitive && m.package_name() == name.as_str())
            })
            .cloned()
            .collect();
        let mut discards: IndexSet<String> = IndexSet::new();
        let mut keep: IndexMap<String, ResolvedModule> = IndexMap::new();
        let mut warnings = Vec::new();

        for (key, group) in grouped {
            let members: Vec<String> = group
                .package_names()
                .filter(|name| !running_ignore.contains(*name))
                .map(str::to_string)
                .collect();

            if members.len() <= 1 {
                for name in &members {
                    let module = group
                        .find(name)
                        .ok_or_else(|| ResolveError::module_not_found(name, key))?;
                    keep.insert(name.clone(), module.clone());
                }
                continue;
            }

            let (selection, cascade) = {
                let cx = GroupContext {
                    group,
                    members,
                    loaded,
                    ignore: &running_ignore,
                };
                self.run_group(&cx)?
            };

            for name in &selection.selected {
                let module = group
                    .find(name)
                    .ok_or_else(|| ResolveError::module_not_found(name, key))?;
                keep.insert(name.clone(), module.clone());
            }
            for name in &selection.unselected {
                running_ignore.insert(name.clone());
                discards.insert(name.clone());
            }
            match cascade {
                Cascade::None => {}
                Cascade::Discard(dependents) => {
                    for name in dependents {
                        running_ignore.insert(name.clone());
                        discards.insert(name);
                    }
                }
                Cascade::Keep(dependents) => {
                    for dependent in dependents {
                        let declared = loaded
                            .iter()
                            .find(|m| m.package_name() == dependent)
                            .map(|m| m.module.dependencies.clone())
                            .unwrap_or_default();
                        for dependency in declared
                            .into_iter()
                            .filter(|d| selection.unselected.contains(d))
                        {
                            let warning = ResolveWarning::DependentKept {
                                dependent: dependent.clone(),
                                dependency,
                            };
                            warning.emit();
                            warnings.push(warning);
                        }
                    }
                }
            }
        }

        keep.retain(|name, _| !discards.contains(name));
        let ignore: Vec<String> = discards.into_iter().collect();

        if !ignore.is_empty() {
            tracing::info!("The following modules will be ignored: {}", ignore.join(", "));
            if let Some(store) = store {
                let answer = self.ask(
                    "Add the ignored modules to your config so they are skipped next time?",
                    &[YES.to_string(), NO.to_string()],
                )?;
                if answer == YES {
                    store.persist_ignored(&ignore)?;
                }
            }
        }

        Ok(Resolution {
            keep: keep.into_values().collect(),
            ignore,
            warnings,
        })
    }

    fn run_group(&mut self, cx: &GroupContext<'_>) -> ResolveResult<(Selection, Cascade)> {
        let mut state = ConflictState::Selecting;
        while let Some((question, choices)) = state.prompt(cx) {
            let answer = self.prompter.select(&question, &choices)?;
            state = transition(state, &answer, cx)?;
        }
        match state {
            ConflictState::Committed { selection, cascade } => Ok((selection, cascade)),
            _ => unreachable!("only a committed state has no prompt"),
        }
    }

    fn ask(&mut self, question: &str, choices: &[String]) -> ResolveResult<String> {
        let answer = self.prompter.select(question, choices)?;
        if choices.contains(&answer) {
            Ok(answer)
        } else {
            Err(ResolveError::invalid_answer(question, &answer, choices))
        }
    }
}

/// Answers questions from a fixed queue and records what was asked
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub asked: Vec<(String, Vec<String>)>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&mut self, question: &str, choices: &[String]) -> ResolveResult<String> {
        self.asked.push((question.to_string(), choices.to_vec()));
        self.answers.pop_front().ok_or_else(|| ResolveError::Prompt {
            question: question.to_string(),
            reason: "no scripted answer left".to_string(),
        })
    }
}
