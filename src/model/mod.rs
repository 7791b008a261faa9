//! Core data model types for zkonacci

mod hash;

pub use hash::Hash;

/// A tree position. Its low-order bits, read LSB first, address the leaf.
pub type Key = u64;

/// The payload stored at a key, sized like a circuit field element.
pub type Value = ruint::aliases::U256;

/// Order of the BN254 scalar field, the field the circuit computes over.
///
/// Digests and values handed to the circuit must lie below it; larger
/// integers would be silently reduced by the proving toolchain.
pub const FIELD_MODULUS: Value = Value::from_limbs([
    0x43e1_f593_f000_0001,
    0x2833_e848_79b9_7091,
    0xb850_45b6_8181_585d,
    0x3064_4e72_e131_a029,
]);

/// Whether `value` is a canonical field element
pub fn in_field(value: &Value) -> bool {
    value < &FIELD_MODULUS
}
