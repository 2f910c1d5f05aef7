//! End-to-end accounting scenarios over both accountants.
//!
//! The cell kind here uses multiplier 1, one unit per byte, 1000 display
//! bytes and 8 bytes per type so the numbers stay readable.

use std::cell::RefCell;

use megacell_core::math::SATURATED;
use megacell_core::record::{read_u64, write_u64, PersistedRecord};
use megacell_core::{
    open_cell, Actionable, AlterationListener, Cell, CellInventory, CellKind, CellStatus,
    CellTier, CellVariant, CompactingAccountant, CompressionRecipe, DirectAccountant, Host,
    ItemChannel, ItemKey, KeyAmount, PartitionConfig, PartitionPolicy, RecipeDecomposer,
    TagRecord, MAX_TYPES,
};

const CHANNEL: ItemChannel = ItemChannel::new(1);

const A: ItemKey = ItemKey::new(1);
const B: ItemKey = ItemKey::new(2);
const C: ItemKey = ItemKey::new(3);

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn kind() -> CellKind {
    CellKind {
        name: "scenario".to_string(),
        multiplier: 1,
        max_types: MAX_TYPES,
        tiers: vec![CellTier::new("1000", 1000, 8)],
    }
}

fn host() -> Host<'static> {
    Host::new(&CHANNEL, &PartitionPolicy)
}

#[derive(Default)]
struct Recorder {
    calls: RefCell<Vec<Vec<KeyAmount>>>,
}

impl AlterationListener for Recorder {
    fn on_quantities_changed(&self, changes: &[KeyAmount]) {
        self.calls.borrow_mut().push(changes.to_vec());
    }
}

// =============================================================================
// Direct
// =============================================================================

#[test]
fn direct_fill_then_overflow() {
    init_tracing();
    let kind = kind();
    let mut cell: Cell<TagRecord> = Cell::new(0);
    let mut inv = DirectAccountant::new(&mut cell, &kind, host()).unwrap();

    assert_eq!(inv.inject(KeyAmount::new(A, 500), Actionable::Modulate), None);
    assert_eq!(inv.stored_item_count(), 500);
    assert_eq!(inv.stored_item_types(), 1);

    let rest = inv.inject(KeyAmount::new(B, 600), Actionable::Modulate);
    assert_eq!(rest, Some(KeyAmount::new(B, 108)));
    assert_eq!(inv.stored_item_count(), 992);
    assert_eq!(inv.stored_item_types(), 2);
}

#[test]
fn direct_sixty_fourth_type_is_rejected() {
    let kind = kind();
    let mut cell: Cell<TagRecord> = Cell::new(0);
    {
        let mut inv = DirectAccountant::new(&mut cell, &kind, host()).unwrap();
        for id in 0..63 {
            assert_eq!(
                inv.inject(KeyAmount::new(ItemKey::new(100 + id), 1), Actionable::Modulate),
                None
            );
        }
        assert_eq!(inv.remaining_item_types(), 0);
    }
    let before = cell.record.clone();

    let mut inv = DirectAccountant::new(&mut cell, &kind, host()).unwrap();
    let extra = KeyAmount::new(ItemKey::new(999), 1);
    assert_eq!(inv.inject(extra, Actionable::Modulate), Some(extra));
    assert_eq!(inv.stored_item_types(), 63);
    assert_eq!(inv.stored_item_count(), 63);
    assert_eq!(inv.status(), CellStatus::HasRoomForMore);
    drop(inv);
    assert_eq!(cell.record, before);
}

#[test]
fn direct_capacity_is_conserved() {
    let kind = kind();
    let mut cell: Cell<TagRecord> = Cell::new(0);
    let mut inv = DirectAccountant::new(&mut cell, &kind, host()).unwrap();

    for (id, amount) in [(1, 300), (2, 250), (3, 700), (4, 1)] {
        let key = ItemKey::new(id);
        let rest = inv.inject(KeyAmount::new(key, amount), Actionable::Modulate);
        let taken = amount - rest.map_or(0, |r| r.amount);
        assert_eq!(inv.stored_count(key), taken as u64);
        assert!(inv.stored_item_count() <= inv.capacity_units());
    }
    assert_eq!(inv.stored_item_count(), 992);
    assert_eq!(inv.status(), CellStatus::Full);
}

#[test]
fn direct_round_trip_through_record() {
    let kind = kind();
    let mut cell: Cell<TagRecord> = Cell::new(0);
    {
        let mut inv = DirectAccountant::new(&mut cell, &kind, host()).unwrap();
        inv.inject(KeyAmount::new(A, 10), Actionable::Modulate);
        inv.inject(KeyAmount::new(ItemKey::new(u32::MAX), 20), Actionable::Modulate);
    }

    let snapshot = cell.record.clone();
    let mut reopened = Cell::with_record(0, snapshot);
    let inv = DirectAccountant::new(&mut reopened, &kind, host()).unwrap();
    assert_eq!(inv.stored_count(A), 10);
    assert_eq!(inv.stored_count(ItemKey::new(u32::MAX)), 20);
    assert_eq!(inv.stored_item_count(), 30);
}

#[test]
fn direct_saturates_instead_of_wrapping() {
    let kind = CellKind {
        multiplier: SATURATED,
        ..kind()
    };

    let mut record = TagRecord::new();
    record.put_int("types", 1);
    record.put_int("type0Key", A.to_field());
    write_u64(&mut record, "type0Count", SATURATED - 5);
    let mut cell = Cell::with_record(0, record);

    let mut inv = DirectAccountant::new(&mut cell, &kind, host()).unwrap();
    assert_eq!(inv.stored_count(A), SATURATED - 5);
    assert_eq!(inv.capacity_units(), SATURATED);

    let rest = inv.inject(KeyAmount::new(A, i64::MAX), Actionable::Modulate);
    assert_eq!(rest, Some(KeyAmount::new(A, i64::MAX - 5)));
    assert_eq!(inv.stored_count(A), SATURATED);
    assert_eq!(inv.stored_item_count(), SATURATED);
    assert_eq!(inv.status(), CellStatus::Full);
}

// =============================================================================
// Compacting
// =============================================================================

fn family() -> RecipeDecomposer {
    RecipeDecomposer::from_recipes(&[
        CompressionRecipe::new(A, B, 9),
        CompressionRecipe::new(B, C, 9),
    ])
}

#[test]
fn compacting_notifies_and_simulates() {
    init_tracing();
    let kind = kind();
    let decomposer = family();
    let recorder = Recorder::default();
    let host = host().with_decomposer(&decomposer).with_listener(&recorder);
    let mut cell: Cell<TagRecord> =
        Cell::new(0).with_partition(PartitionConfig::from_keys([A]));

    let mut inv = CompactingAccountant::new(&mut cell, &kind, host).unwrap();
    assert_eq!(inv.inject(KeyAmount::new(A, 9), Actionable::Modulate), None);
    assert_eq!(inv.stored_base_units(), 9);
    assert_eq!(recorder.calls.borrow().as_slice(), &[vec![KeyAmount::new(B, 1)]]);

    // Simulated extraction reports a quantity but changes nothing
    assert_eq!(
        inv.extract(KeyAmount::new(B, 1), Actionable::Simulate),
        Some(KeyAmount::new(B, 1))
    );
    assert_eq!(inv.stored_base_units(), 9);
    assert_eq!(recorder.calls.borrow().len(), 1);

    assert_eq!(
        inv.extract(KeyAmount::new(B, 1), Actionable::Modulate),
        Some(KeyAmount::new(B, 1))
    );
    assert_eq!(inv.stored_base_units(), 0);
    assert_eq!(recorder.calls.borrow()[1], vec![KeyAmount::new(A, -9)]);
}

#[test]
fn compacting_base_units_are_conserved() {
    let kind = kind();
    let decomposer = family();
    let host = host().with_decomposer(&decomposer);
    let mut cell: Cell<TagRecord> =
        Cell::new(0).with_partition(PartitionConfig::from_keys([B]));
    let mut inv = CompactingAccountant::new(&mut cell, &kind, host).unwrap();

    inv.inject(KeyAmount::new(C, 2), Actionable::Modulate);
    inv.inject(KeyAmount::new(A, 5), Actionable::Modulate);
    inv.extract(KeyAmount::new(B, 3), Actionable::Modulate);

    // 162 + 5 - 27
    assert_eq!(inv.stored_base_units(), 140);
    for (index, tier) in inv.chain().iter().enumerate() {
        assert_eq!(inv.quantity_at_tier(index), 140 / u64::from(tier.rate));
    }
    assert!(inv.stored_base_units() <= inv.capacity_base_units());
}

#[test]
fn compacting_accepts_every_tier_of_the_seeded_family() {
    let kind = kind();
    let decomposer = family();
    let host = host().with_decomposer(&decomposer);
    let mut cell: Cell<TagRecord> =
        Cell::new(0).with_partition(PartitionConfig::from_keys([A]));
    let mut inv = CompactingAccountant::new(&mut cell, &kind, host).unwrap();

    assert_eq!(inv.inject(KeyAmount::new(B, 2), Actionable::Modulate), None);
    assert_eq!(inv.inject(KeyAmount::new(C, 1), Actionable::Modulate), None);
    assert_eq!(inv.stored_base_units(), 99);
    assert_eq!(inv.stored_quantity(A), 99);
    assert_eq!(inv.stored_quantity(B), 11);
    assert_eq!(inv.stored_quantity(C), 1);
}

#[test]
fn compacting_round_trip_restores_record() {
    let kind = kind();
    let decomposer = family();
    let host = host().with_decomposer(&decomposer);
    let mut cell: Cell<TagRecord> =
        Cell::new(0).with_partition(PartitionConfig::from_keys([A]));
    {
        let mut inv = CompactingAccountant::new(&mut cell, &kind, host).unwrap();
        inv.derive_chain();
    }
    let before = cell.record.clone();

    {
        let mut inv = CompactingAccountant::new(&mut cell, &kind, host).unwrap();
        assert_eq!(inv.inject(KeyAmount::new(B, 7), Actionable::Modulate), None);
        assert_eq!(inv.stored_base_units(), 63);
        assert_eq!(
            inv.extract(KeyAmount::new(B, 7), Actionable::Modulate),
            Some(KeyAmount::new(B, 7))
        );
        assert_eq!(inv.stored_base_units(), 0);
    }
    assert_eq!(cell.record, before);
}

#[test]
fn compacting_simulate_matches_modulate_remainder() {
    let kind = kind();
    let decomposer = family();
    let host = host().with_decomposer(&decomposer);
    let mut cell: Cell<TagRecord> =
        Cell::new(0).with_partition(PartitionConfig::from_keys([A]));
    let mut inv = CompactingAccountant::new(&mut cell, &kind, host).unwrap();

    // 992 base units of room, so 12 of the 15 blocks fit
    let what = KeyAmount::new(C, 15);
    let simulated = inv.inject(what, Actionable::Simulate);
    assert_eq!(inv.stored_base_units(), 0);
    let modulated = inv.inject(what, Actionable::Modulate);
    assert_eq!(simulated, Some(KeyAmount::new(C, 3)));
    assert_eq!(simulated, modulated);
    assert_eq!(inv.stored_base_units(), 972);
}

#[test]
fn compacting_partition_is_locked_while_holding() {
    let kind = kind();
    let decomposer = family();
    let host = host().with_decomposer(&decomposer);
    let mut cell: Cell<TagRecord> =
        Cell::new(0).with_partition(PartitionConfig::from_keys([A]));
    {
        let mut inv = CompactingAccountant::new(&mut cell, &kind, host).unwrap();
        inv.inject(KeyAmount::new(A, 1), Actionable::Modulate);
    }

    cell.partition = PartitionConfig::from_keys([ItemKey::new(77)]);
    {
        let mut inv = CompactingAccountant::new(&mut cell, &kind, host).unwrap();
        let other = KeyAmount::new(ItemKey::new(77), 1);
        assert_eq!(inv.inject(other, Actionable::Modulate), Some(other));
        assert_eq!(inv.stored_quantity(A), 1);
    }
    assert_eq!(cell.partition, PartitionConfig::from_keys([A]));
}

// =============================================================================
// Shared Interface
// =============================================================================

#[test]
fn open_cell_dispatches_by_variant() {
    let kind = kind();
    let decomposer = family();
    let host = host().with_decomposer(&decomposer);

    for variant in [CellVariant::Direct, CellVariant::Compacting] {
        let mut cell: Cell<TagRecord> =
            Cell::new(0).with_partition(PartitionConfig::from_keys([A]));
        let mut inv = open_cell(variant, &mut cell, &kind, host).unwrap();

        assert_eq!(inv.status(), CellStatus::Empty);
        assert_eq!(inv.inject(KeyAmount::new(A, 18), Actionable::Modulate), None);
        assert_eq!(inv.stored_quantity(A), 18);
        assert_eq!(inv.report().variant, variant);
        assert_eq!(inv.report().used_bytes, 26);
    }
}

#[test]
fn zero_and_negative_amounts_are_never_admitted() {
    let kind = kind();
    for variant in [CellVariant::Direct, CellVariant::Compacting] {
        let mut cell: Cell<TagRecord> =
            Cell::new(0).with_partition(PartitionConfig::from_keys([A]));
        let mut inv = open_cell(variant, &mut cell, &kind, host()).unwrap();

        for amount in [0, -1, i64::MIN] {
            let what = KeyAmount::new(A, amount);
            assert_eq!(inv.inject(what, Actionable::Modulate), Some(what));
            assert_eq!(inv.extract(what, Actionable::Modulate), None);
        }
        assert!(inv.available_stacks().is_empty());
    }
}

#[test]
fn simulate_never_touches_the_record() {
    let kind = kind();
    let mut cell: Cell<TagRecord> = Cell::new(0);
    write_u64(&mut cell.record, "storedCount", 0);
    let before = cell.record.clone();

    let mut inv = open_cell(CellVariant::Direct, &mut cell, &kind, host()).unwrap();
    assert_eq!(inv.inject(KeyAmount::new(A, 5), Actionable::Simulate), None);
    drop(inv);

    assert_eq!(cell.record, before);
    assert_eq!(read_u64(&cell.record, "storedCount"), 0);
}
