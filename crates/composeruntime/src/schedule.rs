//! Execution-order computation via a dataflow dry run
//!
//! A generalized Kahn's algorithm driven by readiness counters rather than
//! edge removal: starting from `entry`, every dequeued module "publishes"
//! its output names, each publication bumps the counter of every consumer
//! slot waiting on that name, and a consumer is enqueued exactly when its
//! counter reaches its declared input arity. The arity match is the sole
//! enqueue trigger, so a module fed twice by the same producer is still
//! scheduled exactly once. Cycles and unreachable modules are not detected
//! here; they simply never reach their threshold and are absent from the
//! order, which the executor surfaces later as an unresolved-value error.

use crate::graph::SlotRef;
use composecore::{InputSpec, ENTRY, EXIT};
use indexmap::IndexMap;
use std::collections::{HashMap, VecDeque};

/// Compute the fixed execution order over non-sentinel modules.
///
/// Depends only on the declaration structure, never on data values, so
/// repeated runs over the same tables yield the same sequence.
pub(crate) fn schedule(
    inputs: &IndexMap<String, InputSpec>,
    out_names: &IndexMap<String, Vec<String>>,
    consumers: &HashMap<String, Vec<SlotRef>>,
) -> Vec<String> {
    let mut ready: HashMap<&str, usize> = inputs.keys().map(|name| (name.as_str(), 0)).collect();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(ENTRY);

    let mut order = Vec::new();

    while let Some(current) = queue.pop_front() {
        if let Some(published) = out_names.get(current) {
            for varname in published {
                let Some(waiting) = consumers.get(varname) else {
                    continue;
                };
                for slot_ref in waiting {
                    let Some(count) = ready.get_mut(slot_ref.module.as_str()) else {
                        continue;
                    };
                    *count += 1;
                    let arity = inputs.get(&slot_ref.module).map(InputSpec::len).unwrap_or(0);
                    if *count == arity {
                        queue.push_back(slot_ref.module.as_str());
                    }
                }
            }
        }

        if current != ENTRY && current != EXIT {
            order.push(current.to_string());
        }
    }

    order
}
