use nesbridge::{BridgeError, Instance, Phase};
use nesbridge_emulator::{
    frame::{HEIGHT, WIDTH},
    testing::{demo_rom, jam_rom},
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

fn blitted(inst: &Instance) -> Vec<u8> {
    let mut buf = vec![0; inst.blit_len()];
    inst.blit(&mut buf);
    buf
}

#[test]
fn phases_follow_loading_and_stepping() {
    let mut inst = Instance::new();
    assert_eq!(inst.phase(), Phase::Unloaded);

    inst.load_ines(&demo_rom()).unwrap();
    assert_eq!(inst.phase(), Phase::Loaded);

    inst.emulate_frame(0, 0).unwrap();
    assert_eq!(inst.phase(), Phase::Running);

    assert!(inst.load_ines(&[0; 8]).is_err());
    assert_eq!(inst.phase(), Phase::Unloaded);
    assert!(matches!(
        inst.emulate_frame(0, 0),
        Err(BridgeError::Core(Error::NoCartridge))
    ));
}

#[test]
fn dimensions_are_fixed() {
    assert_eq!(Instance::new().dimensions(), (256, 240));
    assert_eq!(Instance::new().blit_len(), 256 * 240 * 4);
}

#[test]
fn blit_is_opaque_bgra() {
    let inst = running(6);
    let out = blitted(&inst);

    assert!(out.chunks_exact(4).all(|px| px[3] == 0xFF));
    // The demo draws more than the backdrop
    let first = &out[..4];
    assert!(out.chunks_exact(4).any(|px| px != first));
}

#[test]
fn hidden_sprites_change_the_picture() {
    let mut a = running(9);
    let mut b = running(9);
    b.set_sprite_mode(0).unwrap();

    a.emulate_frame(0, 0).unwrap();
    b.emulate_frame(0, 0).unwrap();
    assert_ne!(blitted(&a), blitted(&b));
}

#[test]
fn invalid_sprite_limit_is_rejected() {
    let mut inst = running(1);
    let err = inst.set_sprite_mode(16).unwrap_err();
    assert!(matches!(err, BridgeError::InvalidSpriteMode(16)));
    inst.set_sprite_mode(64).unwrap();
}

#[test]
fn same_input_same_output() {
    let mut a = running(0);
    let mut b = running(0);
    for i in 0..30u8 {
        a.emulate_frame(i, !i).unwrap();
        b.emulate_frame(i, !i).unwrap();
    }
    assert_eq!(blitted(&a), blitted(&b));
}

#[test]
fn joypad_reads_are_counted() {
    let inst = running(10);
    assert_eq!(inst.joypad_read_count(), 8);
}

#[test]
fn audio_is_read_in_pieces() {
    let mut inst = running(5);
    let (count, chans) = inst.audio_info();
    assert_eq!(chans, 1);
    assert!(count > 100);

    let mut head = [0i16; 100];
    assert_eq!(inst.read_samples(&mut head), 100);

    let mut rest = vec![0i16; count];
    assert_eq!(inst.read_samples(&mut rest), count - 100);
    assert_eq!(inst.read_samples(&mut rest), 0);
}

#[test]
fn unsupported_sample_rate() {
    let mut inst = Instance::new();
    assert!(matches!(
        inst.set_sample_rate(10),
        Err(BridgeError::Core(Error::UnsupportedSampleRate(10)))
    ));
    inst.set_sample_rate(48_000).unwrap();
}

#[test]
fn jammed_cpu_is_an_error() {
    let mut inst = Instance::new();
    inst.load_ines(&jam_rom()).unwrap();
    let err = inst.emulate_frame(0, 0).unwrap_err();
    assert_eq!(err.to_string(), "CPU jammed at 0x8000");
}

#[test]
fn bound_buffer_receives_each_frame() {
    let pitch = 300;
    let mut pixels = vec![0xAAu8; pitch * HEIGHT];
    let mut inst = running(5);

    unsafe { inst.bind_pixel_buffer(pixels.as_mut_ptr(), pitch) }.unwrap();
    inst.emulate_frame(0, 0).unwrap();

    for y in 0..HEIGHT {
        let row = &pixels[y * pitch..(y + 1) * pitch];
        assert_eq!(&row[..WIDTH], inst.frame().row(y));
        assert!(row[WIDTH..].iter().all(|&b| b == 0xAA));
    }

    unsafe { inst.bind_pixel_buffer(std::ptr::null_mut(), 0) }.unwrap();
    pixels.fill(0xAA);
    inst.emulate_frame(0, 0).unwrap();
    assert!(pixels.iter().all(|&b| b == 0xAA));
}

#[test]
fn narrow_pitch_is_rejected() {
    let mut pixels = vec![0u8; 100 * HEIGHT];
    let mut inst = running(1);
    assert!(unsafe { inst.bind_pixel_buffer(pixels.as_mut_ptr(), 100) }.is_err());
}

#[test]
fn soft_reset_keeps_running() {
    let mut inst = running(5);
    inst.reset(false);
    inst.emulate_frame(0, 0).unwrap();
    inst.reset(true);
    for _ in 0..3 {
        inst.emulate_frame(0, 0).unwrap();
    }
}
