use nesbridge::{BridgeError, Instance};
use nesbridge_emulator::{
    carts::PRG_RAM_SIZE,
    error::StateError,
    testing::{demo_rom, demo_rom_with, TestCart},
    Error,
};

fn running(frames: usize) -> Instance {
    let mut inst = Instance::new();
    inst.load_ines(&demo_rom()).unwrap();
    for _ in 0..frames {
        inst.emulate_frame(0, 0).unwrap();
    }
    inst
}

fn saved_state(inst: &Instance) -> Vec<u8> {
    let mut buf = vec![0; inst.state_size().unwrap()];
    inst.save_state(&mut buf).unwrap();
    buf
}

fn saved_battery(inst: &Instance) -> Vec<u8> {
    let mut buf = vec![0; inst.battery_ram_size().unwrap()];
    inst.save_battery_ram(&mut buf).unwrap();
    buf
}

#[test]
fn probe_is_stable_across_frames() {
    let mut inst = running(1);
    let size = inst.state_size().unwrap();
    assert!(size > 0);
    assert_eq!(inst.state_size().unwrap(), size);

    for _ in 0..5 {
        inst.emulate_frame(0x08, 0).unwrap();
    }
    assert_eq!(inst.state_size().unwrap(), size);
}

#[test]
fn state_buffer_must_match_exactly() {
    let inst = running(3);
    let size = inst.state_size().unwrap();

    let mut exact = vec![0; size];
    inst.save_state(&mut exact).unwrap();

    let mut short = vec![0; size - 1];
    let err = inst.save_state(&mut short).unwrap_err();
    assert!(matches!(err, BridgeError::BufferUnderrun { expected, .. } if expected == size - 1));
    assert_eq!(err.to_string(), "Buffer Underrun!");

    let mut long = vec![0; size + 1];
    let err = inst.save_state(&mut long).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::BufferUnderrun { expected, written } if expected == size + 1 && written == size
    ));
}

#[test]
fn empty_buffer_is_an_underrun() {
    let inst = running(1);
    assert!(matches!(
        inst.save_state(&mut []),
        Err(BridgeError::BufferUnderrun { expected: 0, written: 0 })
    ));
}

#[test]
fn state_moves_between_instances() {
    let mut a = running(20);
    let state = saved_state(&a);

    let mut b = Instance::new();
    b.load_ines(&demo_rom()).unwrap();
    b.load_state(&state).unwrap();

    for _ in 0..10 {
        a.emulate_frame(0x81, 0).unwrap();
        b.emulate_frame(0x81, 0).unwrap();
    }
    assert_eq!(saved_state(&a), saved_state(&b));
    assert_eq!(a.frame().pixels(), b.frame().pixels());

    let mut shown_a = vec![0; a.blit_len()];
    let mut shown_b = vec![0; b.blit_len()];
    a.blit(&mut shown_a);
    b.blit(&mut shown_b);
    assert_eq!(shown_a, shown_b);
}

#[test]
fn state_needs_a_cartridge() {
    let inst = Instance::new();
    assert!(matches!(
        inst.state_size(),
        Err(BridgeError::Core(Error::NoCartridge))
    ));
}

#[test]
fn state_of_another_cartridge_is_rejected() {
    let state = saved_state(&running(2));

    let mut other = Instance::new();
    other
        .load_ines(&demo_rom_with(&TestCart::new().mapper(2).prg_banks(2)))
        .unwrap();
    assert!(matches!(
        other.load_state(&state),
        Err(BridgeError::Core(Error::State(StateError::WrongCartridge)))
    ));
}

#[test]
fn battery_round_trip() {
    let mut inst = running(4);
    assert!(inst.has_battery_ram());
    assert_eq!(inst.battery_ram_size().unwrap(), PRG_RAM_SIZE);

    let mut data = vec![0u8; PRG_RAM_SIZE];
    for (i, b) in data.iter_mut().enumerate() {
        *b = (i * 7) as u8;
    }
    inst.load_battery_ram(&data).unwrap();
    assert_eq!(saved_battery(&inst), data);

    let mut short = vec![0; PRG_RAM_SIZE - 1];
    assert!(matches!(
        inst.save_battery_ram(&mut short),
        Err(BridgeError::BufferUnderrun { .. })
    ));
}

#[test]
fn clearing_battery_fills_with_ff() {
    let mut inst = running(4);
    inst.load_battery_ram(&[0x12; PRG_RAM_SIZE]).unwrap();

    inst.clear_battery_ram().unwrap();
    assert!(saved_battery(&inst).iter().all(|&b| b == 0xFF));

    inst.clear_battery_ram().unwrap();
    assert!(saved_battery(&inst).iter().all(|&b| b == 0xFF));
}

#[test]
fn cartridge_without_battery_has_nothing_to_save() {
    let mut inst = Instance::new();
    inst.load_ines(&demo_rom_with(&TestCart::new().battery(false)))
        .unwrap();

    assert!(!inst.has_battery_ram());
    assert_eq!(inst.battery_ram_size().unwrap(), 0);
    inst.save_battery_ram(&mut []).unwrap();
    inst.load_battery_ram(&[1, 2, 3]).unwrap();
    inst.clear_battery_ram().unwrap();
}

#[test]
fn battery_ops_without_cartridge_do_nothing() {
    let mut inst = Instance::new();
    assert_eq!(inst.battery_ram_size().unwrap(), 0);
    inst.clear_battery_ram().unwrap();
}
