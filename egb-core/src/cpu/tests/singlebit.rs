use super::{run_test, ExpectedState};

#[test]
fn test_bit() {
    run_test(
        // XOR A; LD A, 0x80; BIT 7, A
        "AF3E80CB7F",
        &ExpectedState {
            f: Some(0x20),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; LD A, 0x80; BIT 0, A
        "AF3E80CB47",
        &ExpectedState {
            f: Some(0xA0),
            ..ExpectedState::empty()
        },
    );

    // BIT preserves the carry flag
    run_test(
        // LD A, 0x01; SCF; BIT 0, A
        "3E0137CB47",
        &ExpectedState {
            f: Some(0x30),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn test_bit_indirect_hl() {
    run_test(
        // XOR A; LD HL, 0xCD20; LD (HL), 0x04; BIT 2, (HL)
        "AF2120CD3604CB56",
        &ExpectedState {
            f: Some(0x20),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn set_bit_leaves_flags() {
    run_test(
        // XOR A; LD B, 0x00; SET 3, B
        "AF0600CBD8",
        &ExpectedState {
            b: Some(0x08),
            f: Some(0x80),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn reset_bit() {
    run_test(
        // XOR A; LD A, 0xFF; RES 0, A
        "AF3EFFCB87",
        &ExpectedState {
            a: Some(0xFE),
            f: Some(0x80),
            ..ExpectedState::empty()
        },
    );
}
