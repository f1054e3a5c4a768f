use serde::Serialize;
use crate::cache::Access;
use crate::config::CacheGeometry;
use crate::lookup::{Comparison, Placement};
use crate::replacement_policies::Replacement;
use crate::store::LineRef;

/// How a step should be presented
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Info,
    Success,
    Error,
    Warning,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct TraceStep {
    pub title: String,
    pub description: String,
    pub kind: StepKind,
}

/// The narrated steps of one access, in the order they happened
///
/// Steps are numbered from 1 in their titles. The sequence never changes once recorded, so a
/// presentation layer can index into it freely
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Trace {
    steps: Vec<TraceStep>,
}

impl Trace {
    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&TraceStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn push(&mut self, title: &str, description: String, kind: StepKind) {
        self.steps.push(TraceStep {
            title: format!("{}. {title}", self.steps.len() + 1),
            description,
            kind,
        });
    }
}

/// Narrates an access which has already run
///
/// Comparisons are described from the tags recorded during the lookup, so the trace reflects the
/// lines as they were before any replacement
///
/// # Arguments
///
/// * `access`: The completed access
/// * `geometry`: The geometry of the cache the access ran against
///
/// returns: Trace
pub fn record(access: &Access, geometry: &CacheGeometry) -> Trace {
    let mut trace = Trace::default();
    let address = &access.address;
    let tag = address.tag;
    let word = address.word;

    trace.push(
        "Memory address received",
        format!(
            "The CPU requests the {}-bit address {address}. {}",
            geometry.address_bits(),
            match access.placement {
                Placement::DirectMapped { .. } => "It is split into fields according to the layout of the cache.",
                Placement::FullyAssociative => "In a fully associative cache the block may be in ANY line.",
                Placement::SetAssociative { .. } => "In a set associative cache the block may be in any way of ONE specific set.",
            }
        ),
        StepKind::Info,
    );

    let tag_part = format!("Tag: {tag} ({} bits = {})", tag.width(), tag.value());
    let word_part = format!("Word: {word} ({} bits = position {})", word.width(), word.value());
    let decoded = match (access.placement, address.index) {
        (Placement::DirectMapped { index }, Some(bits)) => {
            format!("{tag_part}, Index: {bits} ({} bits = L{index}), {word_part}", bits.width())
        }
        (Placement::SetAssociative { set }, Some(bits)) => {
            format!("{tag_part}, Set: {bits} ({} bits = set {set}), {word_part}", bits.width())
        }
        _ => format!(
            "{tag_part}, {word_part}. There are no line bits, the tag is compared against all {} lines.",
            geometry.lines()
        ),
    };
    trace.push("Address decoded", decoded, StepKind::Info);

    match access.placement {
        Placement::DirectMapped { index } => trace.push(
            "Line selection",
            format!(
                "The {} index bits select line L{index} out of {} lines directly. In a direct mapped cache every address maps to exactly ONE line.",
                geometry.index_bits(),
                geometry.lines()
            ),
            StepKind::Warning,
        ),
        Placement::FullyAssociative => trace.push(
            "Search across every line",
            format!("The tag {tag} is compared against the tag of every line at once, with one comparator per line."),
            StepKind::Warning,
        ),
        Placement::SetAssociative { set } => {
            let ways = geometry.ways_per_set();
            trace.push(
                "Set selection",
                format!("The set bits select set {set}. If the block is cached it must be in this set, but it may be in ANY of its ways."),
                StepKind::Warning,
            );
            trace.push(
                &format!("Parallel search in the {ways} ways of set {set}"),
                format!("The tag {tag} is compared against the tag of every way of set {set} at once. Only {ways} comparators are needed, fewer than a fully associative cache."),
                StepKind::Info,
            );
        }
    }

    record_comparisons(&mut trace, access);

    match &access.replacement {
        None => record_hit(&mut trace, access),
        Some(replacement) => record_miss(&mut trace, access, replacement),
    }
    trace
}

fn record_comparisons(trace: &mut Trace, access: &Access) {
    let tag = access.address.tag;
    match (access.placement, access.result.comparisons.as_slice()) {
        (Placement::DirectMapped { index }, [comparison]) => {
            if comparison.valid {
                trace.push(
                    "Valid bit check",
                    format!("Valid = 1. Line L{index} holds a block."),
                    StepKind::Success,
                );
                if comparison.matched {
                    trace.push(
                        "Tag comparison",
                        format!("Tag match: address tag {tag} = stored tag {}", comparison.stored_tag),
                        StepKind::Success,
                    );
                } else {
                    trace.push(
                        "Tag comparison",
                        format!("Tag mismatch: address tag {tag} != stored tag {}", comparison.stored_tag),
                        StepKind::Error,
                    );
                }
            } else {
                trace.push(
                    "Valid bit check",
                    format!("Valid = 0. Line L{index} is empty, which is an automatic miss."),
                    StepKind::Error,
                );
            }
        }
        (placement, comparisons) => {
            let heading = match placement {
                Placement::SetAssociative { set } => format!("Comparisons in set {set}:"),
                _ => "Comparisons performed:".to_string(),
            };
            let details = comparisons
                .iter()
                .map(describe_comparison)
                .collect::<Vec<_>>()
                .join("\n");
            trace.push("Comparison results", format!("{heading}\n{details}"), StepKind::Info);
        }
    }
}

fn describe_comparison(comparison: &Comparison) -> String {
    let line = match comparison.line {
        LineRef::Way { way, .. } => format!("Way {way}"),
        line => line.to_string(),
    };
    if !comparison.valid {
        format!("{line}: invalid (V=0), not compared")
    } else if comparison.matched {
        format!("{line}: tag {} MATCH", comparison.stored_tag)
    } else {
        format!("{line}: tag {} no match", comparison.stored_tag)
    }
}

fn record_hit(trace: &mut Trace, access: &Access) {
    let position = access.address.word_index();
    let word = access.delivered_word();
    let found = match access.placement {
        Placement::DirectMapped { .. } => String::new(),
        _ => format!("Tag found in {}. ", access.line()),
    };
    trace.push(
        "Cache hit",
        format!("{found}The block is in the cache. The word at position {position} is read: {word}"),
        StepKind::Success,
    );
    trace.push(
        "Word delivered",
        format!("The word {word} is sent to the CPU, in a cycle or two."),
        StepKind::Success,
    );
}

fn record_miss(trace: &mut Trace, access: &Access, replacement: &Replacement) {
    let address = &access.address;
    let tag = address.tag;
    let reason = match access.placement {
        Placement::DirectMapped { .. } => match access.result.comparisons.first() {
            Some(comparison) if comparison.valid => "Reason: the tag doesn't match.".to_string(),
            _ => "Reason: the line is invalid.".to_string(),
        },
        Placement::FullyAssociative => format!("The tag {tag} is not in any valid line."),
        Placement::SetAssociative { set } => format!("The tag {tag} is not in any way of set {set}."),
    };
    trace.push(
        "Cache miss",
        format!("{reason} The block has to be loaded from main memory."),
        StepKind::Error,
    );
    trace.push(
        "Main memory access",
        format!(
            "Block {} (the block holding address {address}) is requested from main memory, which takes around 100-200 cycles.",
            replacement.block_number
        ),
        StepKind::Warning,
    );

    let victim = replacement.victim;
    let selection = match (access.placement, replacement.evicted) {
        (Placement::DirectMapped { .. }, Some(evicted)) => format!(
            "Direct mapping leaves no choice: the block can only go to line {victim}. Its current block (tag {evicted}) is discarded."
        ),
        (Placement::DirectMapped { .. }, None) => {
            format!("Direct mapping leaves no choice: the block can only go to line {victim}, which is empty.")
        }
        (placement, Some(evicted)) => format!(
            "Selected {victim}. Every candidate {} holds a block, so the first one is replaced and its block (tag {evicted}) is discarded.",
            domain_name(placement)
        ),
        (placement, None) => format!(
            "Selected {victim}, the first empty candidate {}.",
            domain_name(placement)
        ),
    };
    trace.push("Victim selection", selection, StepKind::Warning);
    trace.push(
        "Cache update",
        format!("The block is stored in {victim}. The tag is set to {tag} and Valid = 1."),
        StepKind::Info,
    );
    trace.push(
        "Word delivered",
        format!(
            "The word at position {} is now cached and sent to the CPU: {}. Repeating this access will hit.",
            address.word_index(),
            replacement.delivered_word
        ),
        StepKind::Success,
    );
}

fn domain_name(placement: Placement) -> String {
    match placement {
        Placement::SetAssociative { set } => format!("way in set {set}"),
        _ => "line in the cache".to_string(),
    }
}
