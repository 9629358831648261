//! Per-instruction-address timing attribution for the assembly view.
//!
//! The address-granularity counterpart of [`crate::line_timings`]: rows are
//! scoped by native symbol instead of source file, so a function that was
//! inlined into two different outer functions reports its hits under the
//! symbol actually on the queried chain.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::frame_table::FrameTable;
use crate::native_symbols::NativeSymbolIndex;
use crate::sample_table::SampleTable;
use crate::stack_table::{StackIndex, StackTable};

/// Per-stack-row address information for one native symbol.
#[derive(Debug, Clone)]
pub struct StackAddressInfo {
    /// For each stack row, the set of addresses inside the symbol hit
    /// anywhere on the row's chain.
    pub stack_addresses: Vec<Option<Rc<BTreeSet<u64>>>>,
    /// For each stack row, the address that receives self time when a
    /// sample's leaf is this row.
    pub self_address: Vec<Option<u64>>,
}

/// Accumulated address hits for one native symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressTimings {
    /// Sample weight per address, counted once per sample even when
    /// recursion puts the address on the chain twice.
    pub total_address_hits: BTreeMap<u64, f64>,
    /// Sample weight per address for samples whose self time lands on it.
    pub self_address_hits: BTreeMap<u64, f64>,
}

/// Resolve per-stack-row address info for one native symbol.
///
/// Frames count when their `native_symbol` column references `symbol`; a
/// mere function match is not enough. `inverted` has the same meaning as in
/// [`crate::line_timings::get_stack_line_info`]: chains of an inverted
/// stack table run leaf-first, so self addresses are inherited from the
/// chain root.
pub fn get_stack_address_info(
    stack_table: &StackTable,
    frame_table: &FrameTable,
    symbol: NativeSymbolIndex,
    inverted: bool,
) -> StackAddressInfo {
    let len = stack_table.len();
    let mut stack_addresses: Vec<Option<Rc<BTreeSet<u64>>>> = Vec::with_capacity(len);
    let mut self_address: Vec<Option<u64>> = Vec::with_capacity(len);
    let mut outer_address: Vec<Option<u64>> = Vec::with_capacity(len);

    for i in 0..len {
        let row = StackIndex(i as u32);
        let prefix = stack_table.prefix(row);
        let frame = stack_table.frame(row);
        let in_symbol = frame_table.native_symbol(frame) == Some(symbol);
        let address = if in_symbol {
            frame_table.address(frame)
        } else {
            None
        };

        let prefix_addresses = prefix.and_then(|p| stack_addresses[p.usize()].clone());
        let addresses = match (address, prefix_addresses) {
            (Some(address), Some(prefix_addresses)) => {
                if prefix_addresses.contains(&address) {
                    Some(prefix_addresses)
                } else {
                    let mut set = (*prefix_addresses).clone();
                    set.insert(address);
                    Some(Rc::new(set))
                }
            }
            (Some(address), None) => Some(Rc::new(BTreeSet::from([address]))),
            (None, prefix_addresses) => prefix_addresses,
        };
        stack_addresses.push(addresses);

        if inverted {
            let inherited = match prefix {
                Some(p) => self_address[p.usize()],
                None => address,
            };
            self_address.push(inherited);
            outer_address.push(None);
        } else {
            // Inlined frames share the machine address of their outermost
            // frame; self time is attributed there.
            let prefix_outer = prefix.and_then(|p| outer_address[p.usize()]);
            let outer = if frame_table.inline_depth(frame) == 0 {
                address
            } else {
                prefix_outer
            };
            outer_address.push(outer);
            self_address.push(if in_symbol {
                if frame_table.inline_depth(frame) == 0 {
                    address
                } else {
                    outer
                }
            } else {
                None
            });
        }
    }

    StackAddressInfo {
        stack_addresses,
        self_address,
    }
}

/// Fold the samples over the per-row address info.
pub fn get_address_timings(info: &StackAddressInfo, samples: &SampleTable) -> AddressTimings {
    let mut timings = AddressTimings::default();
    for (_, stack, weight) in samples.iter() {
        let Some(stack) = stack else { continue };
        if let Some(addresses) = &info.stack_addresses[stack.usize()] {
            for &address in addresses.iter() {
                *timings.total_address_hits.entry(address).or_insert(0.0) += weight;
            }
        }
        if let Some(address) = info.self_address[stack.usize()] {
            *timings.self_address_hits.entry(address).or_insert(0.0) += weight;
        }
    }
    timings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{CategoryIndex, SubcategoryIndex};
    use crate::func_table::FuncFlags;
    use crate::lib_table::{Lib, LibTable};
    use crate::thread::Thread;
    use crate::timestamp::Timestamp;

    fn lib() -> Lib {
        Lib {
            name: "libxul.so".to_string(),
            debug_name: "libxul.so".to_string(),
            path: "/usr/lib/libxul.so".to_string(),
            debug_path: "/usr/lib/libxul.so".to_string(),
            debug_id: None,
            code_id: None,
            arch: None,
        }
    }

    // One thread, one lib, one symbol; each path entry is (name, address,
    // in_symbol).
    fn thread_with_addresses(
        paths: &[&[(&str, u64, bool)]],
    ) -> (Thread, NativeSymbolIndex) {
        let mut thread = Thread::default();
        let mut lib_table = LibTable::new();
        let lib_index = lib_table.push(lib());
        thread.lib_table = lib_table;
        let symbol_name = thread.string_table.index_for_string("DoWork");
        let symbol = thread
            .native_symbol_table
            .push(lib_index, 0x1000, Some(0x200), symbol_name);
        for (i, path) in paths.iter().enumerate() {
            let mut prefix = None;
            for (name, address, in_symbol) in *path {
                let name = thread.string_table.index_for_string(name);
                let func = thread.func_table.index_for_func(
                    name,
                    FuncFlags::empty(),
                    None,
                    None,
                    None,
                    None,
                );
                let frame = thread.frame_table.index_for_frame(
                    func,
                    None,
                    None,
                    None,
                    None,
                    None,
                    Some(*address),
                    in_symbol.then_some(symbol),
                    0,
                    None,
                );
                prefix = Some(thread.stack_table.index_for_stack(
                    prefix,
                    frame,
                    CategoryIndex(0),
                    SubcategoryIndex::OTHER,
                ));
            }
            thread
                .samples
                .push(Timestamp::from_millis_since_reference(i as f64), prefix, 1.0);
        }
        (thread, symbol)
    }

    fn timings(thread: &Thread, symbol: NativeSymbolIndex, inverted: bool) -> AddressTimings {
        let info = get_stack_address_info(
            &thread.stack_table,
            &thread.frame_table,
            symbol,
            inverted,
        );
        get_address_timings(&info, &thread.samples)
    }

    #[test]
    fn hits_are_scoped_to_the_symbol() {
        let (thread, symbol) = thread_with_addresses(&[
            &[("main", 0x50, false), ("DoWork", 0x1010, true), ("DoWork", 0x1024, true)],
            &[("main", 0x50, false), ("DoWork", 0x1010, true)],
        ]);
        let timings = timings(&thread, symbol, false);
        // 0x50 belongs to a frame outside the symbol.
        assert_eq!(timings.total_address_hits.get(&0x50), None);
        assert_eq!(timings.total_address_hits.get(&0x1010), Some(&2.0));
        assert_eq!(timings.total_address_hits.get(&0x1024), Some(&1.0));
        assert_eq!(timings.self_address_hits.get(&0x1010), Some(&1.0));
        assert_eq!(timings.self_address_hits.get(&0x1024), Some(&1.0));
    }

    #[test]
    fn recursion_counts_each_sample_once() {
        let (thread, symbol) = thread_with_addresses(&[&[
            ("DoWork", 0x1010, true),
            ("helper", 0x2000, false),
            ("DoWork", 0x1010, true),
        ]]);
        let timings = timings(&thread, symbol, false);
        assert_eq!(timings.total_address_hits.get(&0x1010), Some(&1.0));
        assert_eq!(timings.self_address_hits.get(&0x1010), Some(&1.0));
    }

    #[test]
    fn inversion_produces_identical_timings() {
        let paths: &[&[(&str, u64, bool)]] = &[
            &[("main", 0x50, false), ("DoWork", 0x1010, true)],
            &[("DoWork", 0x1024, true)],
        ];
        let (thread, symbol) = thread_with_addresses(paths);

        let reversed: Vec<Vec<(&str, u64, bool)>> = paths
            .iter()
            .map(|p| p.iter().rev().copied().collect())
            .collect();
        let reversed_refs: Vec<&[(&str, u64, bool)]> =
            reversed.iter().map(|p| p.as_slice()).collect();
        let (inverted_thread, inverted_symbol) = thread_with_addresses(&reversed_refs);

        assert_eq!(
            timings(&thread, symbol, false),
            timings(&inverted_thread, inverted_symbol, true)
        );
    }
}
