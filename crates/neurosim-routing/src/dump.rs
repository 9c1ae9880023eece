// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Debug dumps of routing stores

use core::fmt;

use tracing::debug;

use crate::error::Result;
use crate::store::RoutingStore;
use crate::table::TargetTable;

const RULE: &str = "---------------------------------------";

/// Local connection indices of every LID, one line per LID
pub struct TargetsDump<'a> {
    store: &'a RoutingStore,
}

impl fmt::Display for TargetsDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-------------TARGETS-------------------")?;
        for targets in self.store.target_lists() {
            for target in targets {
                write!(f, "{}, ", target.lcid())?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", RULE)
    }
}

/// Send buffer positions of every LID, one line per LID
pub struct SecondarySendBufferPosDump<'a> {
    store: &'a RoutingStore,
}

impl fmt::Display for SecondarySendBufferPosDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-------------SENDBUFFERPOS-------------------")?;
        for positions in self.store.secondary_lists() {
            for pos in positions {
                write!(f, "{}, ", pos)?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", RULE)
    }
}

impl TargetTable {
    pub fn targets_dump(&self, thread_id: usize) -> Result<TargetsDump<'_>> {
        Ok(TargetsDump {
            store: self.store(thread_id)?,
        })
    }

    /// Works in any phase; positions are shown as stored.
    pub fn secondary_send_buffer_pos_dump(&self, thread_id: usize) -> Result<SecondarySendBufferPosDump<'_>> {
        Ok(SecondarySendBufferPosDump {
            store: self.store(thread_id)?,
        })
    }

    pub fn print_targets(&self, thread_id: usize) -> Result<()> {
        let dump = self.targets_dump(thread_id)?;
        debug!(thread = thread_id, "\n{}", dump);
        Ok(())
    }

    pub fn print_secondary_send_buffer_pos(&self, thread_id: usize) -> Result<()> {
        let dump = self.secondary_send_buffer_pos_dump(thread_id)?;
        debug!(thread = thread_id, "\n{}", dump);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::table::{TableSettings, TargetTable};
    use crate::target_data::TargetData;
    use crate::topology::StaticTopology;

    #[test]
    fn test_dumps_render_one_line_per_lid() {
        let mut table = TargetTable::new(TableSettings::default()).unwrap();
        table.initialize(&StaticTopology::single_rank(1).unwrap()).unwrap();
        table.prepare(0, 2).unwrap();
        table.add_target(0, 0, &TargetData::primary(0, 0, 0, 4)).unwrap();
        table.add_target(0, 0, &TargetData::primary(0, 0, 0, 9)).unwrap();
        table.add_target(0, 0, &TargetData::secondary(1, 6)).unwrap();

        let targets = table.targets_dump(0).unwrap().to_string();
        assert_eq!(
            targets,
            "-------------TARGETS-------------------\n4, 9, \n\n\n\n---------------------------------------\n"
        );

        let positions = table.secondary_send_buffer_pos_dump(0).unwrap().to_string();
        assert_eq!(
            positions,
            "-------------SENDBUFFERPOS-------------------\n\n6, \n\n---------------------------------------\n"
        );

        table.print_targets(0).unwrap();
        assert!(table.print_secondary_send_buffer_pos(3).is_err());
    }
}
