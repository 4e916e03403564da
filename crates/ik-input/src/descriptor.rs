//! HID report descriptor parsing
//!
//! Flattens a report descriptor into a list of [`ReportItem`]s, one per data
//! field, each knowing where its bits live inside a raw report. This is what
//! lets the joystick pipeline read buttons and axes from controllers it has
//! never seen before.

use std::collections::HashMap;

use bitflags::bitflags;
use ik_core::error::DescriptorError;

/// Generic Desktop usage page
pub const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;
/// Button usage page
pub const USAGE_PAGE_BUTTON: u16 = 0x09;
/// Generic Desktop X axis
pub const USAGE_X: u16 = 0x30;
/// Generic Desktop Y axis
pub const USAGE_Y: u16 = 0x31;

/// Upper bound on data fields accepted from a single descriptor
pub const MAX_REPORT_ITEMS: usize = 128;

/// Widest field a report item may declare
pub const MAX_FIELD_BITS: u32 = 32;

/// Largest report accepted, excluding the report id byte. Matches the
/// full speed interrupt endpoint limit.
pub const MAX_REPORT_LEN: usize = 64;

const LONG_ITEM_PREFIX: u8 = 0xFE;

// Item types
const TYPE_MAIN: u8 = 0;
const TYPE_GLOBAL: u8 = 1;
const TYPE_LOCAL: u8 = 2;

// Main item tags
const TAG_INPUT: u8 = 0x8;
const TAG_OUTPUT: u8 = 0x9;
const TAG_COLLECTION: u8 = 0xA;
const TAG_FEATURE: u8 = 0xB;
const TAG_END_COLLECTION: u8 = 0xC;

// Global item tags
const TAG_USAGE_PAGE: u8 = 0x0;
const TAG_LOGICAL_MIN: u8 = 0x1;
const TAG_LOGICAL_MAX: u8 = 0x2;
const TAG_REPORT_SIZE: u8 = 0x7;
const TAG_REPORT_ID: u8 = 0x8;
const TAG_REPORT_COUNT: u8 = 0x9;
const TAG_PUSH: u8 = 0xA;
const TAG_POP: u8 = 0xB;

// Local item tags
const TAG_USAGE: u8 = 0x0;
const TAG_USAGE_MIN: u8 = 0x1;
const TAG_USAGE_MAX: u8 = 0x2;

bitflags! {
    /// Input/Output/Feature item data flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MainFlags: u32 {
        const CONSTANT   = 0x001;
        const VARIABLE   = 0x002;
        const RELATIVE   = 0x004;
        const WRAP       = 0x008;
        const NONLINEAR  = 0x010;
        const NO_PREFERRED = 0x020;
        const NULL_STATE = 0x040;
        const VOLATILE   = 0x080;
        const BUFFERED_BYTES = 0x100;
    }
}

/// Main item kind a field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Input,
    Output,
    Feature,
}

/// Usage page and usage id pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    pub page: u16,
    pub id: u16,
}

impl Usage {
    pub const fn new(page: u16, id: u16) -> Self {
        Self { page, id }
    }

    /// Resolve a local usage value against the current usage page. Four byte
    /// usages carry their own page in the upper half.
    fn resolve(value: u32, size: usize, page: u16) -> Self {
        if size == 4 {
            Self::new((value >> 16) as u16, value as u16)
        } else {
            Self::new(page, value as u16)
        }
    }
}

/// A single data field within a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportItem {
    pub item_type: ItemType,
    pub flags: MainFlags,
    /// Report id prefix, 0 when the device does not use report ids
    pub report_id: u8,
    /// Bit position within the report, not counting the report id byte
    pub bit_offset: u32,
    pub bit_size: u32,
    pub usage: Usage,
    pub logical_min: i32,
    pub logical_max: i32,
}

impl ReportItem {
    /// Read this field from a raw report.
    ///
    /// Returns `None` if the report belongs to a different report id or is too
    /// short to contain the field.
    pub fn read(&self, report: &[u8]) -> Option<i32> {
        let data = if self.report_id != 0 {
            let (&id, rest) = report.split_first()?;
            if id != self.report_id {
                return None;
            }
            rest
        } else {
            report
        };

        let start = self.bit_offset as usize;
        let end = start.checked_add(self.bit_size as usize)?;
        if self.bit_size == 0 || end > data.len() * 8 {
            return None;
        }

        let bits = self.bit_size.min(32);
        let mut raw = 0u32;
        for i in 0..bits as usize {
            let pos = start + i;
            if data[pos / 8] & (1 << (pos % 8)) != 0 {
                raw |= 1 << i;
            }
        }

        if self.logical_min < 0 && bits < 32 {
            let shift = 32 - bits;
            Some(((raw << shift) as i32) >> shift)
        } else {
            Some(raw as i32)
        }
    }

    /// Centre of the logical range, rounded up so 0..=255 centres on 0x80.
    ///
    /// Devices that leave the logical range empty are centred on the middle
    /// of their raw bit range.
    pub fn midpoint(&self) -> i64 {
        if self.logical_min == self.logical_max {
            let bits = self.bit_size.clamp(1, 32);
            return 1i64 << (bits - 1);
        }
        (i64::from(self.logical_min) + i64::from(self.logical_max) + 1).div_euclid(2)
    }

    pub fn is_input(&self) -> bool {
        self.item_type == ItemType::Input
    }
}

/// Parsed report layout of a device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportInfo {
    items: Vec<ReportItem>,
    uses_report_ids: bool,
    input_report_size: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct GlobalState {
    usage_page: u16,
    logical_min: i32,
    logical_max_raw: u32,
    logical_max_signed: i32,
    report_size: u32,
    report_id: u8,
    report_count: u32,
}

impl GlobalState {
    /// Logical maximum is only sign extended when the minimum is negative,
    /// many descriptors encode 0..255 as a single 0xFF byte.
    fn logical_max(&self) -> i32 {
        if self.logical_min < 0 {
            self.logical_max_signed
        } else {
            self.logical_max_raw as i32
        }
    }
}

#[derive(Debug, Clone, Default)]
struct LocalState {
    usages: Vec<Usage>,
    usage_min: Option<Usage>,
    usage_max: Option<Usage>,
}

impl LocalState {
    fn usage_for(&self, index: u32) -> Usage {
        if let Some(usage) = self.usages.get(index as usize).or(self.usages.last()) {
            return *usage;
        }
        match self.usage_min {
            Some(min) => {
                let mut id = min.id.saturating_add(index.min(u16::MAX as u32) as u16);
                if let Some(max) = self.usage_max {
                    id = id.min(max.id);
                }
                Usage::new(min.page, id)
            }
            None => Usage::default(),
        }
    }
}

/// One short item
struct RawItem {
    item_type: u8,
    tag: u8,
    size: usize,
    data: u32,
}

impl RawItem {
    fn signed(&self) -> i32 {
        match self.size {
            1 => self.data as u8 as i8 as i32,
            2 => self.data as u16 as i16 as i32,
            _ => self.data as i32,
        }
    }
}

struct ItemReader<'a> {
    desc: &'a [u8],
    pos: usize,
}

impl<'a> ItemReader<'a> {
    fn new(desc: &'a [u8]) -> Self {
        Self { desc, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    /// Next short item, skipping long items. `Ok(None)` at the end.
    fn next_item(&mut self) -> Result<Option<RawItem>, DescriptorError> {
        loop {
            let start = self.pos;
            let Some(&prefix) = self.desc.get(self.pos) else {
                return Ok(None);
            };
            self.pos += 1;

            if prefix == LONG_ITEM_PREFIX {
                let len = *self
                    .desc
                    .get(self.pos)
                    .ok_or(DescriptorError::Truncated(start))? as usize;
                // data size byte, long tag byte, data
                let skip = 2 + len;
                if self.pos + skip > self.desc.len() {
                    return Err(DescriptorError::Truncated(start));
                }
                self.pos += skip;
                continue;
            }

            let size = match prefix & 0x03 {
                3 => 4,
                n => n as usize,
            };
            let bytes = self
                .desc
                .get(self.pos..self.pos + size)
                .ok_or(DescriptorError::Truncated(start))?;
            let data = bytes
                .iter()
                .rev()
                .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
            self.pos += size;

            return Ok(Some(RawItem {
                item_type: (prefix >> 2) & 0x03,
                tag: prefix >> 4,
                size,
                data,
            }));
        }
    }
}

fn check_report_len(bits: u32) -> Result<(), DescriptorError> {
    if bits as usize > MAX_REPORT_LEN * 8 {
        return Err(DescriptorError::ReportTooLong(MAX_REPORT_LEN));
    }
    Ok(())
}

impl ReportInfo {
    /// Parse a raw report descriptor.
    pub fn parse(desc: &[u8]) -> Result<Self, DescriptorError> {
        let mut reader = ItemReader::new(desc);
        let mut global = GlobalState::default();
        let mut stack: Vec<GlobalState> = Vec::new();
        let mut local = LocalState::default();
        let mut depth = 0usize;
        let mut offsets: HashMap<(u8, ItemType), u32> = HashMap::new();
        let mut info = ReportInfo::default();

        while let Some(item) = reader.next_item()? {
            match item.item_type {
                TYPE_MAIN => {
                    let item_type = match item.tag {
                        TAG_INPUT => Some(ItemType::Input),
                        TAG_OUTPUT => Some(ItemType::Output),
                        TAG_FEATURE => Some(ItemType::Feature),
                        TAG_COLLECTION => {
                            depth += 1;
                            None
                        }
                        TAG_END_COLLECTION => {
                            depth = depth
                                .checked_sub(1)
                                .ok_or(DescriptorError::UnbalancedCollection(reader.position()))?;
                            None
                        }
                        _ => None,
                    };
                    if let Some(item_type) = item_type {
                        if global.report_size > MAX_FIELD_BITS {
                            return Err(DescriptorError::FieldTooWide(reader.position()));
                        }
                        let offset = offsets.entry((global.report_id, item_type)).or_insert(0);
                        info.add_fields(
                            item_type,
                            MainFlags::from_bits_retain(item.data),
                            &global,
                            &local,
                            offset,
                        )?;
                    }
                    local = LocalState::default();
                }
                TYPE_GLOBAL => match item.tag {
                    TAG_USAGE_PAGE => global.usage_page = item.data as u16,
                    TAG_LOGICAL_MIN => global.logical_min = item.signed(),
                    TAG_LOGICAL_MAX => {
                        global.logical_max_raw = item.data;
                        global.logical_max_signed = item.signed();
                    }
                    TAG_REPORT_SIZE => global.report_size = item.data,
                    TAG_REPORT_ID => {
                        global.report_id = item.data as u8;
                        info.uses_report_ids = true;
                    }
                    TAG_REPORT_COUNT => global.report_count = item.data,
                    TAG_PUSH => stack.push(global),
                    TAG_POP => {
                        global = stack
                            .pop()
                            .ok_or(DescriptorError::EmptyStack(reader.position()))?;
                    }
                    _ => {}
                },
                TYPE_LOCAL => match item.tag {
                    TAG_USAGE => local
                        .usages
                        .push(Usage::resolve(item.data, item.size, global.usage_page)),
                    TAG_USAGE_MIN => {
                        local.usage_min =
                            Some(Usage::resolve(item.data, item.size, global.usage_page))
                    }
                    TAG_USAGE_MAX => {
                        local.usage_max =
                            Some(Usage::resolve(item.data, item.size, global.usage_page))
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        if depth != 0 {
            return Err(DescriptorError::UnclosedCollection(depth));
        }

        let input_bits = offsets
            .iter()
            .filter(|((_, item_type), _)| *item_type == ItemType::Input)
            .map(|(_, bits)| *bits)
            .max()
            .unwrap_or(0);
        info.input_report_size =
            (input_bits as usize).div_ceil(8) + usize::from(info.uses_report_ids);

        Ok(info)
    }

    fn add_fields(
        &mut self,
        item_type: ItemType,
        flags: MainFlags,
        global: &GlobalState,
        local: &LocalState,
        offset: &mut u32,
    ) -> Result<(), DescriptorError> {
        if flags.contains(MainFlags::CONSTANT) {
            let bits = global.report_size.saturating_mul(global.report_count);
            *offset = offset.saturating_add(bits);
            return check_report_len(*offset);
        }

        for index in 0..global.report_count {
            if self.items.len() >= MAX_REPORT_ITEMS {
                return Err(DescriptorError::TooManyItems(MAX_REPORT_ITEMS));
            }
            self.items.push(ReportItem {
                item_type,
                flags,
                report_id: global.report_id,
                bit_offset: *offset,
                bit_size: global.report_size,
                usage: local.usage_for(index),
                logical_min: global.logical_min,
                logical_max: global.logical_max(),
            });
            *offset = offset.saturating_add(global.report_size);
            check_report_len(*offset)?;
        }
        Ok(())
    }

    /// All data fields in descriptor order
    pub fn items(&self) -> &[ReportItem] {
        &self.items
    }

    /// Input fields only
    pub fn input_items(&self) -> impl Iterator<Item = &ReportItem> {
        self.items.iter().filter(|item| item.is_input())
    }

    /// Whether reports are prefixed with a report id byte
    pub fn uses_report_ids(&self) -> bool {
        self.uses_report_ids
    }

    /// Buffer size needed to hold the largest input report
    pub fn report_size(&self) -> usize {
        self.input_report_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two buttons, 8-bit X/Y with 0..255 range, padded to whole bytes
    const SIMPLE_JOYSTICK: &[u8] = &[
        0x05, 0x01, // Usage Page (Generic Desktop)
        0x09, 0x04, // Usage (Joystick)
        0xA1, 0x01, // Collection (Application)
        0x05, 0x09, //   Usage Page (Button)
        0x19, 0x01, //   Usage Minimum (1)
        0x29, 0x02, //   Usage Maximum (2)
        0x15, 0x00, //   Logical Minimum (0)
        0x25, 0x01, //   Logical Maximum (1)
        0x75, 0x01, //   Report Size (1)
        0x95, 0x02, //   Report Count (2)
        0x81, 0x02, //   Input (Data, Var, Abs)
        0x75, 0x06, //   Report Size (6)
        0x95, 0x01, //   Report Count (1)
        0x81, 0x03, //   Input (Const)
        0x05, 0x01, //   Usage Page (Generic Desktop)
        0x09, 0x30, //   Usage (X)
        0x09, 0x31, //   Usage (Y)
        0x15, 0x00, //   Logical Minimum (0)
        0x25, 0xFF, //   Logical Maximum (255)
        0x75, 0x08, //   Report Size (8)
        0x95, 0x02, //   Report Count (2)
        0x81, 0x02, //   Input (Data, Var, Abs)
        0xC0, // End Collection
    ];

    #[test]
    fn flattens_simple_joystick() {
        let info = ReportInfo::parse(SIMPLE_JOYSTICK).unwrap();
        let items = info.items();
        assert_eq!(items.len(), 4);
        assert!(!info.uses_report_ids());
        assert_eq!(info.report_size(), 3);

        assert_eq!(items[0].usage, Usage::new(USAGE_PAGE_BUTTON, 1));
        assert_eq!(items[1].usage, Usage::new(USAGE_PAGE_BUTTON, 2));
        assert_eq!(items[1].bit_offset, 1);

        assert_eq!(items[2].usage, Usage::new(USAGE_PAGE_GENERIC_DESKTOP, USAGE_X));
        assert_eq!(items[2].bit_offset, 8);
        assert_eq!(items[2].logical_max, 255);
        assert_eq!(items[3].usage, Usage::new(USAGE_PAGE_GENERIC_DESKTOP, USAGE_Y));
        assert_eq!(items[3].bit_offset, 16);
    }

    #[test]
    fn reads_fields() {
        let info = ReportInfo::parse(SIMPLE_JOYSTICK).unwrap();
        let items = info.items();
        let report = [0b0000_0010, 0x00, 0xFF];

        assert_eq!(items[0].read(&report), Some(0));
        assert_eq!(items[1].read(&report), Some(1));
        assert_eq!(items[2].read(&report), Some(0));
        assert_eq!(items[3].read(&report), Some(255));
        assert_eq!(items[3].read(&report[..2]), None);
        assert_eq!(items[2].midpoint(), 0x80);
    }

    #[test]
    fn report_ids_prefix_reports() {
        let desc = [
            0x05, 0x01, 0x09, 0x05, 0xA1, 0x01, // Gamepad application
            0x85, 0x03, //   Report ID (3)
            0x09, 0x30, //   Usage (X)
            0x15, 0x81, //   Logical Minimum (-127)
            0x25, 0x7F, //   Logical Maximum (127)
            0x75, 0x08, 0x95, 0x01, 0x81, 0x02, //   Input
            0xC0,
        ];
        let info = ReportInfo::parse(&desc).unwrap();
        assert!(info.uses_report_ids());
        assert_eq!(info.report_size(), 2);

        let x = &info.items()[0];
        assert_eq!(x.report_id, 3);
        assert_eq!(x.logical_min, -127);
        assert_eq!(x.logical_max, 127);
        assert_eq!(x.midpoint(), 0);
        assert_eq!(x.read(&[3, 0xF6]), Some(-10));
        assert_eq!(x.read(&[4, 0xF6]), None);
        assert_eq!(x.read(&[]), None);
    }

    #[test]
    fn extended_usages_and_push_pop() {
        let desc = [
            0x05, 0x09, // Usage Page (Button)
            0xA4, // Push
            0x05, 0x01, // Usage Page (Generic Desktop)
            0xB4, // Pop
            0x0B, 0x31, 0x00, 0x01, 0x00, // Usage (Generic Desktop: Y), extended
            0x09, 0x05, // Usage (Button 5)
            0x75, 0x04, 0x95, 0x02, 0x81, 0x02, // Input
        ];
        let info = ReportInfo::parse(&desc).unwrap();
        assert_eq!(info.items()[0].usage, Usage::new(USAGE_PAGE_GENERIC_DESKTOP, USAGE_Y));
        assert_eq!(info.items()[1].usage, Usage::new(USAGE_PAGE_BUTTON, 5));
        assert_eq!(info.report_size(), 1);
    }

    #[test]
    fn skips_long_items_and_outputs() {
        let desc = [
            0xFE, 0x02, 0x10, 0xAA, 0xBB, // Long item
            0x05, 0x08, 0x09, 0x01, 0x75, 0x01, 0x95, 0x05, 0x91, 0x02, // Output (LEDs)
            0x05, 0x09, 0x09, 0x01, 0x75, 0x01, 0x95, 0x01, 0x81, 0x02, // Input
        ];
        let info = ReportInfo::parse(&desc).unwrap();
        assert_eq!(info.items().len(), 6);
        assert_eq!(info.input_items().count(), 1);
        assert_eq!(info.input_items().next().unwrap().bit_offset, 0);
        assert_eq!(info.report_size(), 1);
    }

    #[test]
    fn usage_range_is_clamped() {
        let desc = [
            0x05, 0x09, 0x19, 0x01, 0x29, 0x02, // Buttons 1..2
            0x75, 0x01, 0x95, 0x04, 0x81, 0x02, // four fields
        ];
        let info = ReportInfo::parse(&desc).unwrap();
        let ids: Vec<u16> = info.items().iter().map(|item| item.usage.id).collect();
        assert_eq!(ids, vec![1, 2, 2, 2]);
    }

    #[test]
    fn malformed_descriptors() {
        assert_eq!(
            ReportInfo::parse(&[0x05]),
            Err(DescriptorError::Truncated(0))
        );
        assert_eq!(
            ReportInfo::parse(&[0xC0]),
            Err(DescriptorError::UnbalancedCollection(1))
        );
        assert_eq!(ReportInfo::parse(&[0xB4]), Err(DescriptorError::EmptyStack(1)));
        assert_eq!(
            ReportInfo::parse(&[0xA1, 0x01]),
            Err(DescriptorError::UnclosedCollection(1))
        );
        assert_eq!(
            ReportInfo::parse(&[0x75, 0x01, 0x96, 0xFF, 0x00, 0x81, 0x02]),
            Err(DescriptorError::TooManyItems(MAX_REPORT_ITEMS))
        );
        // 0xFFFFFFFF bit padding
        assert_eq!(
            ReportInfo::parse(&[0x77, 0xFF, 0xFF, 0xFF, 0xFF, 0x95, 0x01, 0x81, 0x03]),
            Err(DescriptorError::FieldTooWide(9))
        );
        // 65 bytes of padding
        assert_eq!(
            ReportInfo::parse(&[0x75, 0x08, 0x95, 0x41, 0x81, 0x03]),
            Err(DescriptorError::ReportTooLong(MAX_REPORT_LEN))
        );
        // 17 fields of 32 bits
        assert_eq!(
            ReportInfo::parse(&[0x75, 0x20, 0x95, 0x11, 0x81, 0x02]),
            Err(DescriptorError::ReportTooLong(MAX_REPORT_LEN))
        );
    }

    #[test]
    fn largest_report_is_accepted() {
        // 64 bytes of padding
        let info = ReportInfo::parse(&[0x75, 0x08, 0x95, 0x40, 0x81, 0x03]).unwrap();
        assert_eq!(info.report_size(), MAX_REPORT_LEN);
    }

    #[test]
    fn empty_logical_range_centres_on_bit_range() {
        let desc = [0x05, 0x01, 0x09, 0x30, 0x75, 0x08, 0x95, 0x01, 0x81, 0x02];
        let info = ReportInfo::parse(&desc).unwrap();
        assert_eq!(info.items()[0].midpoint(), 0x80);
    }
}
