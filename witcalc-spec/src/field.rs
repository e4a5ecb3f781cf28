//! Prime field parameters of a compiled circuit
//!
//! The guest reports its prime as a raw little-endian byte span. Everything
//! else is derived from it once:
//!
//! - `n64`: number of 64-bit words covering the prime
//! - `r = 2^(64 * n64)`: Montgomery radix
//! - `r_inv = r^-1 mod prime`
//! - `short_max = 2^31`, `short_min = prime - short_max`: bounds of the two
//!   short wire forms

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpecError};

/// Largest value (exclusive) representable as a short positive element
pub const SHORT_MAX: u32 = 1 << 31;

/// Field parameters derived from the guest prime
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldParams {
    prime: BigUint,
    n8: usize,
    n64: usize,
    r: BigUint,
    r_inv: BigUint,
    short_max: BigUint,
    short_min: BigUint,
}

impl FieldParams {
    /// Derive field parameters from a prime and the raw element byte width
    ///
    /// The prime must be odd and larger than `2^32`, so the short positive
    /// and short negative ranges never overlap, and must fit in `n8` bytes.
    pub fn new(prime: BigUint, n8: usize) -> Result<Self> {
        let short_max = BigUint::from(SHORT_MAX);
        if prime.bits() <= 32 {
            return Err(SpecError::InvalidPrime(format!(
                "{prime} is too small, expected more than 32 bits"
            )));
        }
        if !prime.bit(0) {
            return Err(SpecError::InvalidPrime(format!("{prime} is even")));
        }
        let prime_bytes = (prime.bits() as usize + 7) / 8;
        if prime_bytes > n8 {
            return Err(SpecError::InvalidPrime(format!(
                "{prime} needs {prime_bytes} bytes, element width is {n8}"
            )));
        }

        let n64 = ((prime.bits() as usize - 1) / 64) + 1;
        let r = BigUint::one() << (n64 * 64);
        let r_inv = r.modinv(&prime).ok_or_else(|| {
            SpecError::InvalidPrime(format!("radix 2^{} has no inverse mod {prime}", n64 * 64))
        })?;
        let short_min = &prime - &short_max;

        Ok(Self {
            prime,
            n8,
            n64,
            r,
            r_inv,
            short_max,
            short_min,
        })
    }

    /// Field modulus
    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    /// Byte width of a raw (long form payload) element
    pub fn n8(&self) -> usize {
        self.n8
    }

    /// Number of 64-bit words per element
    pub fn n64(&self) -> usize {
        self.n64
    }

    /// Montgomery radix `2^(64 * n64)`
    pub fn r(&self) -> &BigUint {
        &self.r
    }

    /// Inverse of the Montgomery radix modulo the prime
    pub fn r_inv(&self) -> &BigUint {
        &self.r_inv
    }

    pub fn short_max(&self) -> &BigUint {
        &self.short_max
    }

    pub fn short_min(&self) -> &BigUint {
        &self.short_min
    }

    /// Size in bytes of one wire element: 8-byte header plus payload
    pub fn element_size(&self) -> usize {
        8 + self.n8
    }

    /// Check `value < prime`
    #[inline]
    pub fn contains(&self, value: &BigUint) -> bool {
        value < &self.prime
    }

    /// Reduce an arbitrary signed integer into `[0, prime)`
    pub fn normalize(&self, value: &BigInt) -> BigUint {
        let prime = BigInt::from_biguint(Sign::Plus, self.prime.clone());
        let reduced = ((value % &prime) + &prime) % &prime;
        // reduced is in [0, prime), so the magnitude is the value
        reduced.magnitude().clone()
    }

    /// Convert from Montgomery form: `value * r^-1 mod prime`
    pub fn from_montgomery(&self, value: &BigUint) -> BigUint {
        (value * &self.r_inv) % &self.prime
    }

    /// Convert into Montgomery form: `value * r mod prime`
    pub fn to_montgomery(&self, value: &BigUint) -> BigUint {
        (value * &self.r) % &self.prime
    }

    /// Decode a raw little-endian byte span as an unsigned integer
    pub fn read_raw(bytes: &[u8]) -> BigUint {
        if bytes.iter().all(|b| *b == 0) {
            return BigUint::zero();
        }
        BigUint::from_bytes_le(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BN254: &str =
        "21888242871839275222246405745257275088548364400416034343698204186575808495617";

    fn bn254() -> FieldParams {
        FieldParams::new(BN254.parse().unwrap(), 32).unwrap()
    }

    #[test]
    fn test_bn254_parameters() {
        let field = bn254();
        assert_eq!(field.n64(), 4);
        assert_eq!(field.n8(), 32);
        assert_eq!(field.element_size(), 40);
        assert_eq!(
            field.r().to_string(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639936"
        );
        assert_eq!(
            field.r_inv().to_string(),
            "9915499612839321149637521777990102151350674507940716049588462388200839649614"
        );
        assert_eq!(field.short_max(), &BigUint::from(0x8000_0000u32));
        assert_eq!(
            field.short_min().to_string(),
            "21888242871839275222246405745257275088548364400416034343698204186573661011969"
        );
    }

    #[test]
    fn test_r_times_r_inv_is_one() {
        let field = bn254();
        assert_eq!((field.r() * field.r_inv()) % field.prime(), BigUint::one());
    }

    #[test]
    fn test_r_inv_exact_for_odd_composite() {
        // 2^61 - 1 times 3: odd but not prime, so Fermat would be wrong here
        let modulus = BigUint::from((1u64 << 61) - 1) * 3u32;
        let field = FieldParams::new(modulus.clone(), 8).unwrap();
        assert_eq!((field.r() * field.r_inv()) % &modulus, BigUint::one());
    }

    #[test]
    fn test_small_prime_rejected() {
        assert!(matches!(
            FieldParams::new(BigUint::from(2_147_483_647u32), 4),
            Err(SpecError::InvalidPrime(_))
        ));
    }

    #[test]
    fn test_even_modulus_rejected() {
        let even = BigUint::one() << 64;
        assert!(FieldParams::new(even, 16).is_err());
    }

    #[test]
    fn test_prime_wider_than_element_rejected() {
        assert!(FieldParams::new(BN254.parse().unwrap(), 16).is_err());
    }

    #[test]
    fn test_goldilocks_single_word() {
        // 2^64 - 2^32 + 1
        let p = BigUint::from(0xFFFF_FFFF_0000_0001u64);
        let field = FieldParams::new(p, 8).unwrap();
        assert_eq!(field.n64(), 1);
        assert_eq!(field.r(), &(BigUint::one() << 64));
    }

    #[test]
    fn test_normalize() {
        let field = bn254();
        assert_eq!(field.normalize(&BigInt::from(5)), BigUint::from(5u32));
        assert_eq!(
            field.normalize(&BigInt::from(-1)),
            field.prime() - BigUint::one()
        );
        let wrapped = BigInt::from_biguint(Sign::Plus, field.prime() + 7u32);
        assert_eq!(field.normalize(&wrapped), BigUint::from(7u32));
        assert_eq!(field.normalize(&BigInt::zero()), BigUint::zero());
    }

    #[test]
    fn test_montgomery_roundtrip() {
        let field = bn254();
        for v in [0u64, 1, 2, 33, 0xFFFF_FFFF, u64::MAX] {
            let v = BigUint::from(v);
            assert_eq!(field.from_montgomery(&field.to_montgomery(&v)), v);
        }
    }

    #[test]
    fn test_read_raw() {
        assert_eq!(FieldParams::read_raw(&[0, 0, 0]), BigUint::zero());
        assert_eq!(FieldParams::read_raw(&[0x01, 0x02]), BigUint::from(0x0201u32));
        assert_eq!(FieldParams::read_raw(&[]), BigUint::zero());
    }
}
