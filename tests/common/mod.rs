//! Shared fixtures for the workspace-level tests
//!
//! `PAIR_CIRCUIT` is a hand-written guest that honours the full export
//! contract for a circuit with inputs `a` and `b` and witness `[1, a, b]`.
//! Under sanity checking it rejects a zero input through the host `error`
//! import with code 7, like a failed `===` constraint.

#![allow(dead_code)]

pub const BN254_PRIME: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// Heap start written into the allocator cursor by the data segment
pub const HEAP_START: u32 = 1024;

pub const PAIR_CIRCUIT: &str = r#"
(module
  (import "runtime" "error" (func $error (param i32 i32 i32 i32 i32 i32)))
  (import "runtime" "logSetSignal" (func $logSetSignal (param i32 i32)))
  (import "runtime" "logGetSignal" (func $logGetSignal (param i32 i32)))
  (import "runtime" "logStartComponent" (func $logStartComponent (param i32)))
  (import "runtime" "logFinishComponent" (func $logFinishComponent (param i32)))
  (import "runtime" "log" (func $log (param i32)))

  (memory (export "memory") 1)
  (data (i32.const 0) "\00\04\00\00")
  (data (i32.const 64) "\01\00\00\f0\93\f5\e1\43\91\70\b9\79\48\e8\33\28\5d\58\81\81\b6\45\50\b8\29\a0\31\e1\72\4e\64\30")
  (data (i32.const 128) "Zero input rejected:\00")
  (data (i32.const 160) "main\00")

  (global $sanity (mut i32) (i32.const 0))

  ;; signals live at 256 + 40 * i
  (func $slot (param $i i32) (result i32)
    (i32.add (i32.const 256) (i32.mul (local.get $i) (i32.const 40))))

  (func (export "getFrLen") (result i32) (i32.const 40))
  (func (export "getPRawPrime") (result i32) (i32.const 64))
  (func (export "getNVars") (result i32) (i32.const 3))

  (func (export "init") (param $sanity i32)
    (local $p i32)
    (global.set $sanity (local.get $sanity))
    (local.set $p (i32.const 256))
    (block $done
      (loop $zero
        (br_if $done (i32.ge_u (local.get $p) (i32.const 376)))
        (i64.store (local.get $p) (i64.const 0))
        (local.set $p (i32.add (local.get $p) (i32.const 8)))
        (br $zero)))
    (i32.store (i32.const 256) (i32.const 1))
    (call $logStartComponent (i32.const 0)))

  (func (export "getSignalOffset32") (param $out i32) (param $component i32) (param $msb i32) (param $lsb i32)
    ;; fnv("a")
    (if (i32.and (i32.eq (local.get $msb) (i32.const 0xaf63dc4c))
                 (i32.eq (local.get $lsb) (i32.const 0x8601ec8c)))
      (then (i32.store (local.get $out) (i32.const 1)) (return)))
    ;; fnv("b")
    (if (i32.and (i32.eq (local.get $msb) (i32.const 0xaf63df4c))
                 (i32.eq (local.get $lsb) (i32.const 0x8601f1a5)))
      (then (i32.store (local.get $out) (i32.const 2)) (return)))
    unreachable)

  (func (export "setSignal") (param $component i32) (param $sub i32) (param $signal i32) (param $value i32)
    (local $dst i32)
    (local $k i32)
    (if (i32.ge_u (local.get $signal) (i32.const 3))
      (then unreachable))
    (if (i32.and (global.get $sanity) (i64.eqz (i64.load (local.get $value))))
      (then
        (call $error (i32.const 7) (i32.const 128) (i32.const 0)
                     (local.get $value) (i32.const 256) (i32.const 160))
        unreachable))
    (local.set $dst (call $slot (local.get $signal)))
    (block $done
      (loop $copy
        (br_if $done (i32.ge_u (local.get $k) (i32.const 40)))
        (i64.store (i32.add (local.get $dst) (local.get $k))
                   (i64.load (i32.add (local.get $value) (local.get $k))))
        (local.set $k (i32.add (local.get $k) (i32.const 8)))
        (br $copy)))
    (call $logSetSignal (local.get $signal) (local.get $dst))
    (if (i32.eq (local.get $signal) (i32.const 2))
      (then (call $logFinishComponent (i32.const 0)))))

  (func (export "getPWitness") (param $i i32) (result i32)
    (call $slot (local.get $i)))

  ;; plain little-endian copy at 512, 32 bytes per element; short forms
  ;; are copied as their low word, so only non-negative values survive
  (func (export "getWitnessBuffer") (result i32)
    (local $i i32)
    (local $src i32)
    (local $dst i32)
    (block $done
      (loop $elem
        (br_if $done (i32.ge_u (local.get $i) (i32.const 3)))
        (local.set $src (call $slot (local.get $i)))
        (local.set $dst (i32.add (i32.const 512) (i32.shl (local.get $i) (i32.const 5))))
        (i64.store (local.get $dst) (i64.const 0))
        (i64.store offset=8 (local.get $dst) (i64.const 0))
        (i64.store offset=16 (local.get $dst) (i64.const 0))
        (i64.store offset=24 (local.get $dst) (i64.const 0))
        (if (i32.and (i32.load offset=4 (local.get $src)) (i32.const 0x80000000))
          (then
            (i64.store (local.get $dst) (i64.load offset=8 (local.get $src)))
            (i64.store offset=8 (local.get $dst) (i64.load offset=16 (local.get $src)))
            (i64.store offset=16 (local.get $dst) (i64.load offset=24 (local.get $src)))
            (i64.store offset=24 (local.get $dst) (i64.load offset=32 (local.get $src))))
          (else
            (i32.store (local.get $dst) (i32.load (local.get $src)))))
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        (br $elem)))
    (i32.const 512))
)
"#;

/// The pair circuit with its imports registered under another module name
pub fn pair_circuit_in(namespace: &str) -> String {
    PAIR_CIRCUIT.replace("\"runtime\"", &format!("\"{namespace}\""))
}

/// Read the allocator cursor the way the host does
pub fn cursor(mem: &[u8]) -> u32 {
    u32::from_le_bytes([mem[0], mem[1], mem[2], mem[3]])
}
