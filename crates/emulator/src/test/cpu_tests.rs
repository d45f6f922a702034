use crate::cpu::{Cpu, CpuMemory, P, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR};

const ORIGIN: u16 = 0x0600;

struct FlatMem {
    ram: Vec<u8>,
}

impl FlatMem {
    fn with_program(program: &[u8]) -> Self {
        let mut ram = vec![0; 0x10000];
        ram[ORIGIN as usize..ORIGIN as usize + program.len()].copy_from_slice(program);
        ram[RESET_VECTOR as usize..RESET_VECTOR as usize + 2]
            .copy_from_slice(&ORIGIN.to_le_bytes());
        Self { ram }
    }
}

impl CpuMemory for FlatMem {
    fn read(&mut self, _cpu: &mut Cpu, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    fn write(&mut self, _cpu: &mut Cpu, addr: u16, v: u8) {
        self.ram[addr as usize] = v;
    }
}

fn boot(program: &[u8]) -> (Cpu, FlatMem) {
    let mut mem = FlatMem::with_program(program);
    let mut cpu = Cpu::new();
    cpu.power_on(&mut mem);
    (cpu, mem)
}

fn run(program: &[u8], steps: usize) -> (Cpu, FlatMem) {
    let (mut cpu, mut mem) = boot(program);
    for _ in 0..steps {
        cpu.step(&mut mem);
    }
    (cpu, mem)
}

#[test]
fn power_on_loads_reset_vector() {
    let (cpu, _) = boot(&[]);
    assert_eq!(cpu.pc, ORIGIN);
    assert_eq!(cpu.sp, 0xFD);
    assert!(cpu.p.contains(P::INTERRUPT_DISABLE));
}

#[test]
fn load_sets_zero_and_negative() {
    // LDA #$00
    let (cpu, _) = run(&[0xA9, 0x00], 1);
    assert!(cpu.p.contains(P::ZERO));
    assert!(!cpu.p.contains(P::NEGATIVE));

    // LDX #$80
    let (cpu, _) = run(&[0xA2, 0x80], 1);
    assert_eq!(cpu.x, 0x80);
    assert!(cpu.p.contains(P::NEGATIVE));
    assert!(!cpu.p.contains(P::ZERO));
}

#[test]
fn adc_signed_overflow() {
    // CLC, LDA #$50, ADC #$50
    let (cpu, _) = run(&[0x18, 0xA9, 0x50, 0x69, 0x50], 3);
    assert_eq!(cpu.a, 0xA0);
    assert!(cpu.p.contains(P::OVERFLOW));
    assert!(!cpu.p.contains(P::CARRY));
    assert!(cpu.p.contains(P::NEGATIVE));
}

#[test]
fn sbc_borrows() {
    // SEC, LDA #$00, SBC #$01
    let (cpu, _) = run(&[0x38, 0xA9, 0x00, 0xE9, 0x01], 3);
    assert_eq!(cpu.a, 0xFF);
    assert!(!cpu.p.contains(P::CARRY));
    assert!(cpu.p.contains(P::NEGATIVE));
}

#[test]
fn decimal_flag_does_not_change_addition() {
    // SED, CLC, LDA #$09, ADC #$01
    let (cpu, _) = run(&[0xF8, 0x18, 0xA9, 0x09, 0x69, 0x01], 4);
    assert_eq!(cpu.a, 0x0A);
    assert!(cpu.p.contains(P::DECIMAL));
}

#[test]
fn jsr_rts_round_trip() {
    // JSR $0610, LDA #$01 ... $0610: LDX #$07, RTS
    let mut program = vec![0x20, 0x10, 0x06, 0xA9, 0x01];
    program.resize(0x10, 0xEA);
    program.extend_from_slice(&[0xA2, 0x07, 0x60]);

    let (cpu, mem) = run(&program, 4);
    assert_eq!(cpu.x, 0x07);
    assert_eq!(cpu.a, 0x01);
    assert_eq!(cpu.sp, 0xFD);
    // Return address minus one on the stack
    assert_eq!(mem.ram[0x01FD], 0x06);
    assert_eq!(mem.ram[0x01FC], 0x02);
}

#[test]
fn jmp_indirect_wraps_within_page() {
    let mut program = vec![0x6C, 0xFF, 0x10];
    program.resize(4, 0);
    let (mut cpu, mut mem) = boot(&program);
    mem.ram[0x10FF] = 0x34;
    mem.ram[0x1000] = 0x12;
    mem.ram[0x1100] = 0x56;

    cpu.step(&mut mem);
    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn page_crossing_costs_a_cycle() {
    // LDX #$01, LDA $06FF,X
    let (mut cpu, mut mem) = boot(&[0xA2, 0x01, 0xBD, 0xFF, 0x06]);
    assert_eq!(cpu.step(&mut mem), 2);
    assert_eq!(cpu.step(&mut mem), 5);

    // LDX #$01, LDA $0600,X
    let (mut cpu, mut mem) = boot(&[0xA2, 0x01, 0xBD, 0x00, 0x06]);
    cpu.step(&mut mem);
    assert_eq!(cpu.step(&mut mem), 4);
}

#[test]
fn taken_branch_costs() {
    // LDA #$01, BNE +0
    let (mut cpu, mut mem) = boot(&[0xA9, 0x01, 0xD0, 0x00]);
    cpu.step(&mut mem);
    assert_eq!(cpu.step(&mut mem), 3);

    // LDA #$00, BNE +0
    let (mut cpu, mut mem) = boot(&[0xA9, 0x00, 0xD0, 0x00]);
    cpu.step(&mut mem);
    assert_eq!(cpu.step(&mut mem), 2);
}

#[test]
fn brk_pushes_break_flag_and_skips_padding() {
    let (mut cpu, mut mem) = boot(&[0x00, 0xFF]);
    mem.ram[IRQ_VECTOR as usize..IRQ_VECTOR as usize + 2].copy_from_slice(&0x0700u16.to_le_bytes());

    cpu.step(&mut mem);
    assert_eq!(cpu.pc, 0x0700);
    assert!(cpu.p.contains(P::INTERRUPT_DISABLE));

    let pushed_p = mem.ram[0x01FB];
    assert_ne!(pushed_p & P::B.bits(), 0);
    assert_eq!(u16::from_le_bytes([mem.ram[0x01FC], mem.ram[0x01FD]]), ORIGIN + 2);
}

#[test]
fn nmi_pushes_state_without_break_flag() {
    let (mut cpu, mut mem) = boot(&[0xEA]);
    mem.ram[NMI_VECTOR as usize..NMI_VECTOR as usize + 2].copy_from_slice(&0x0800u16.to_le_bytes());
    let cyc = cpu.cyc;

    cpu.nmi(&mut mem);
    assert_eq!(cpu.pc, 0x0800);
    assert_eq!(cpu.cyc, cyc + 7);
    assert_eq!(mem.ram[0x01FB] & P::B.bits(), 0);
}

#[test]
fn irq_is_masked_by_interrupt_disable() {
    let (mut cpu, mut mem) = boot(&[0xEA]);
    mem.ram[IRQ_VECTOR as usize..IRQ_VECTOR as usize + 2].copy_from_slice(&0x0900u16.to_le_bytes());

    assert!(!cpu.irq(&mut mem));
    assert_eq!(cpu.pc, ORIGIN);

    cpu.p.remove(P::INTERRUPT_DISABLE);
    assert!(cpu.irq(&mut mem));
    assert_eq!(cpu.pc, 0x0900);
}

#[test]
fn rti_restores_status_and_pc() {
    // SEC, BRK, pad; handler: RTI
    let (mut cpu, mut mem) = boot(&[0x38, 0x00, 0xFF, 0xA9, 0x42]);
    mem.ram[IRQ_VECTOR as usize..IRQ_VECTOR as usize + 2].copy_from_slice(&0x0700u16.to_le_bytes());
    mem.ram[0x0700] = 0x40;

    cpu.step(&mut mem);
    cpu.step(&mut mem);
    cpu.step(&mut mem);
    assert_eq!(cpu.pc, ORIGIN + 3);
    assert!(cpu.p.contains(P::CARRY));
    assert!(!cpu.p.contains(P::B));

    cpu.step(&mut mem);
    assert_eq!(cpu.a, 0x42);
}

#[test]
fn lax_loads_a_and_x() {
    // LAX $10
    let (mut cpu, mut mem) = boot(&[0xA7, 0x10]);
    mem.ram[0x10] = 0x9C;
    cpu.step(&mut mem);
    assert_eq!(cpu.a, 0x9C);
    assert_eq!(cpu.x, 0x9C);
    assert!(cpu.p.contains(P::NEGATIVE));
}

#[test]
fn dcp_decrements_then_compares() {
    // LDA #$05, DCP $10
    let (mut cpu, mut mem) = boot(&[0xA9, 0x05, 0xC7, 0x10]);
    mem.ram[0x10] = 0x06;
    cpu.step(&mut mem);
    cpu.step(&mut mem);
    assert_eq!(mem.ram[0x10], 0x05);
    assert!(cpu.p.contains(P::ZERO));
    assert!(cpu.p.contains(P::CARRY));
}

#[test]
fn jam_halts_the_processor() {
    let (mut cpu, mut mem) = boot(&[0x02, 0xA9, 0x01]);
    cpu.step(&mut mem);
    assert!(cpu.jammed);
    assert_eq!(cpu.pc, ORIGIN);

    let cyc = cpu.cyc;
    assert_eq!(cpu.step(&mut mem), 0);
    assert_eq!(cpu.cyc, cyc);
    assert_eq!(cpu.a, 0);
    assert!(!cpu.irq(&mut mem));
}

#[test]
fn reset_clears_jam_and_adjusts_stack() {
    let (mut cpu, mut mem) = boot(&[0x02]);
    cpu.step(&mut mem);
    let sp = cpu.sp;

    cpu.reset(&mut mem);
    assert!(!cpu.jammed);
    assert_eq!(cpu.sp, sp.wrapping_sub(3));
    assert_eq!(cpu.pc, ORIGIN);
}
