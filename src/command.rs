use crate::shard::ShardLayout;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    /// `SETBIT key offset 1`, replies with the previous bit
    Set,
    /// `GETBIT key offset`
    Get,
}

/// One bit operation against one shard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitCommand<'a> {
    pub op: BitOp,
    pub key: &'a str,
    pub offset: u64,
}

impl<'a> BitCommand<'a> {
    pub fn set(key: &'a str, offset: u64) -> Self {
        Self {
            op: BitOp::Set,
            key,
            offset,
        }
    }

    pub fn get(key: &'a str, offset: u64) -> Self {
        Self {
            op: BitOp::Get,
            key,
            offset,
        }
    }
}

/// Commands for a run of items, laid out item-major: the replies for item
/// `i` are `replies[i * per_item..(i + 1) * per_item]`.
///
/// Duplicate positions within an item are kept so every item has the same
/// stride.
#[derive(Debug, Clone)]
pub struct CommandBatch<'a> {
    commands: Vec<BitCommand<'a>>,
    per_item: usize,
}

impl<'a> CommandBatch<'a> {
    pub fn set_bits<I>(layout: &'a ShardLayout, per_item: usize, positions: I) -> Self
    where
        I: IntoIterator<Item = Vec<u64>>,
    {
        Self::build(layout, BitOp::Set, per_item, positions)
    }

    pub fn get_bits<I>(layout: &'a ShardLayout, per_item: usize, positions: I) -> Self
    where
        I: IntoIterator<Item = Vec<u64>>,
    {
        Self::build(layout, BitOp::Get, per_item, positions)
    }

    fn build<I>(
        layout: &'a ShardLayout,
        op: BitOp,
        per_item: usize,
        positions: I,
    ) -> Self
    where
        I: IntoIterator<Item = Vec<u64>>,
    {
        let positions = positions.into_iter();
        let mut commands =
            Vec::with_capacity(positions.size_hint().0 * per_item);
        for item_positions in positions {
            debug_assert_eq!(item_positions.len(), per_item);
            commands.extend(item_positions.into_iter().map(|pos| {
                let (shard, offset) = layout.locate(pos);
                BitCommand {
                    op,
                    key: layout.key(shard),
                    offset,
                }
            }));
        }
        Self { commands, per_item }
    }

    pub fn commands(&self) -> &[BitCommand<'a>] {
        &self.commands
    }

    pub fn per_item(&self) -> usize {
        self.per_item
    }

    pub fn num_items(&self) -> usize {
        if self.per_item == 0 {
            0
        } else {
            self.commands.len() / self.per_item
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Command indices grouped per shard key, each group in submission order.
    pub fn by_shard(&self) -> BTreeMap<&'a str, Vec<usize>> {
        let mut groups: BTreeMap<&'a str, Vec<usize>> = BTreeMap::new();
        for (idx, cmd) in self.commands.iter().enumerate() {
            groups.entry(cmd.key).or_default().push(idx);
        }
        groups
    }

    pub fn shards_touched(&self) -> usize {
        self.by_shard().len()
    }

    /// Folds the replies of each item into one boolean: true when every bit
    /// of that item came back set.
    pub fn demux(&self, replies: &[bool]) -> Vec<bool> {
        debug_assert_eq!(replies.len(), self.commands.len());
        if self.per_item == 0 {
            return Vec::new();
        }
        replies
            .chunks(self.per_item)
            .map(|bits| bits.iter().all(|&bit| bit))
            .collect()
    }
}
