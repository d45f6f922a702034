pub mod op;

use bitflags::bitflags;

use crate::{
    cpu::op::{AddrMode, Instr, Op, OPCODES},
    error::{ensure, StateError},
};

/// The status register
#[derive(Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct P(u8);

bitflags! {
    impl P: u8 {
        const CARRY             = 0b00000001;
        const ZERO              = 0b00000010;
        const INTERRUPT_DISABLE = 0b00000100;
        const DECIMAL           = 0b00001000;
        const B                 = 0b00010000;
        const _5                = 0b00100000;
        const OVERFLOW          = 0b01000000;
        const NEGATIVE          = 0b10000000;
    }
}

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Largest cycle count accepted from a save state.
const CYCLE_LIMIT: u64 = 1 << 60;

#[derive(Clone, bincode::Encode, bincode::Decode)]
pub struct Cpu {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub p: P,

    /// Total elapsed CPU cycles
    pub cyc: u64,

    /// Set when a JAM opcode locked up the processor
    pub jammed: bool,
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("a", &format_args!("{:#04x}", self.a))
            .field("x", &format_args!("{:#04x}", self.x))
            .field("y", &format_args!("{:#04x}", self.y))
            .field("pc", &format_args!("{:#06x}", self.pc))
            .field("sp", &format_args!("{:#04x}", self.sp))
            .field("p", &format_args!("{:#04x}", self.p.bits()))
            .field("cyc", &self.cyc)
            .field("jammed", &self.jammed)
            .finish()
    }
}

/// Everything the CPU can see on its address bus.
///
/// The CPU is handed to every access so that devices which stall the processor, such as OAM DMA,
/// can charge their cycles directly.
pub trait CpuMemory {
    fn read(&mut self, cpu: &mut Cpu, addr: u16) -> u8;

    fn write(&mut self, cpu: &mut Cpu, addr: u16, v: u8);
}

#[derive(Debug, Clone, Copy)]
enum Addr {
    /// The accumulator
    A,
    Mem(u16),
    /// Memory with page crossed
    MemPC(u16),
    Rel(i8),
}

impl Addr {
    fn mem(self) -> u16 {
        match self {
            Addr::Mem(a) | Addr::MemPC(a) => a,
            Addr::A | Addr::Rel(_) => 0,
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            p: P::INTERRUPT_DISABLE | P::_5,
            cyc: 7,
            jammed: false,
        }
    }

    fn read_mem16<Mem: CpuMemory>(&mut self, mem: &mut Mem, addr: u16) -> u16 {
        let l = mem.read(self, addr);
        let r = mem.read(self, addr.wrapping_add(1));
        u16::from_le_bytes([l, r])
    }

    /// Read 16 bits from memory with page wrapping.
    ///
    /// If the address is at the end of a page the second byte comes from the start of the same
    /// page.
    fn read_mem16_pw<Mem: CpuMemory>(&mut self, mem: &mut Mem, addr: u16) -> u16 {
        let l = mem.read(self, addr);
        let r = mem.read(self, (addr.wrapping_add(1) & 0xFF) | (addr & 0xFF00));
        u16::from_le_bytes([l, r])
    }

    /// Load the program counter from the reset vector.
    pub(crate) fn power_on<Mem: CpuMemory>(&mut self, mem: &mut Mem) {
        self.pc = self.read_mem16(mem, RESET_VECTOR);
    }

    /// Soft reset, registers other than the stack pointer and I flag survive.
    pub(crate) fn reset<Mem: CpuMemory>(&mut self, mem: &mut Mem) {
        self.sp = self.sp.wrapping_sub(3);
        self.p |= P::INTERRUPT_DISABLE;
        self.jammed = false;
        self.cyc += 7;
        self.pc = self.read_mem16(mem, RESET_VECTOR);
    }

    fn fetch8<Mem: CpuMemory>(&mut self, mem: &mut Mem) -> u8 {
        let v = mem.read(self, self.pc);
        self.pc = self.pc.wrapping_add(1);
        v
    }

    fn fetch16<Mem: CpuMemory>(&mut self, mem: &mut Mem) -> u16 {
        let v = self.read_mem16(mem, self.pc);
        self.pc = self.pc.wrapping_add(2);
        v
    }

    fn indexed(base: u16, index: u8, penalty: bool) -> Addr {
        let a = base.wrapping_add(index as u16);
        if penalty && a & 0xFF00 != base & 0xFF00 {
            Addr::MemPC(a)
        } else {
            Addr::Mem(a)
        }
    }

    fn fetch_addr<Mem: CpuMemory>(&mut self, mem: &mut Mem, instr: &Instr) -> Addr {
        use AddrMode::*;
        match instr.mode {
            Imp => Addr::A,
            Imm => {
                let v = Addr::Mem(self.pc);
                self.pc = self.pc.wrapping_add(1);
                v
            }
            Zp0 => Addr::Mem(self.fetch8(mem) as u16),
            ZpX => Addr::Mem(self.fetch8(mem).wrapping_add(self.x) as u16),
            ZpY => Addr::Mem(self.fetch8(mem).wrapping_add(self.y) as u16),
            Rel => Addr::Rel(self.fetch8(mem) as i8),
            Abs => Addr::Mem(self.fetch16(mem)),
            AbX => {
                let base = self.fetch16(mem);
                Self::indexed(base, self.x, instr.page_penalty)
            }
            AbY => {
                let base = self.fetch16(mem);
                Self::indexed(base, self.y, instr.page_penalty)
            }
            Ind => {
                let ptr = self.fetch16(mem);
                Addr::Mem(self.read_mem16_pw(mem, ptr))
            }
            IdX => {
                let ptr = self.fetch8(mem).wrapping_add(self.x);
                Addr::Mem(self.read_mem16_pw(mem, ptr as u16))
            }
            IdY => {
                let ptr = self.fetch8(mem);
                let base = self.read_mem16_pw(mem, ptr as u16);
                Self::indexed(base, self.y, instr.page_penalty)
            }
        }
    }

    fn read8<Mem: CpuMemory>(&mut self, mem: &mut Mem, addr: Addr) -> u8 {
        match addr {
            Addr::A => self.a,
            Addr::Mem(a) => mem.read(self, a),
            Addr::MemPC(a) => {
                self.cyc += 1;
                mem.read(self, a)
            }
            Addr::Rel(d) => d as u8,
        }
    }

    fn write8<Mem: CpuMemory>(&mut self, mem: &mut Mem, addr: Addr, v: u8) {
        match addr {
            Addr::A => self.a = v,
            Addr::Mem(a) | Addr::MemPC(a) => mem.write(self, a, v),
            Addr::Rel(_) => {}
        }
    }

    /// Check the fields that must stay in range after a save state was decoded.
    pub(crate) fn validate(&self) -> Result<(), StateError> {
        ensure(self.cyc < CYCLE_LIMIT, "CPU cycle counter")
    }

    /// Execute one instruction and return the cycles it took.
    ///
    /// A jammed CPU does nothing and takes no time, the caller is expected to check
    /// [`Cpu::jammed`].
    pub fn step<Mem: CpuMemory>(&mut self, mem: &mut Mem) -> u64 {
        if self.jammed {
            return 0;
        }

        let start_cycle = self.cyc;

        let opcode = self.fetch8(mem);
        let instr = OPCODES[opcode as usize];
        let addr = self.fetch_addr(mem, &instr);

        self.cyc += instr.cycles as u64;

        match instr.op {
            Op::Adc => {
                let v = self.read8(mem, addr);
                self.add(v);
            }
            Op::Sbc => {
                let v = self.read8(mem, addr);
                self.add(!v);
            }
            Op::And => {
                self.a &= self.read8(mem, addr);
                self.update_nz(self.a);
            }
            Op::Ora => {
                self.a |= self.read8(mem, addr);
                self.update_nz(self.a);
            }
            Op::Eor => {
                self.a ^= self.read8(mem, addr);
                self.update_nz(self.a);
            }
            Op::Asl => {
                self.modify(mem, addr, Self::asl);
            }
            Op::Lsr => {
                self.modify(mem, addr, Self::lsr);
            }
            Op::Rol => {
                self.modify(mem, addr, Self::rol);
            }
            Op::Ror => {
                self.modify(mem, addr, Self::ror);
            }
            Op::Inc => {
                self.modify(mem, addr, |cpu, v| {
                    let v = v.wrapping_add(1);
                    cpu.update_nz(v);
                    v
                });
            }
            Op::Dec => {
                self.modify(mem, addr, |cpu, v| {
                    let v = v.wrapping_sub(1);
                    cpu.update_nz(v);
                    v
                });
            }
            Op::Bit => {
                let m = self.read8(mem, addr);
                self.p.set(P::OVERFLOW, m & 0x40 != 0);
                self.p.set(P::NEGATIVE, m & 0x80 != 0);
                self.p.set(P::ZERO, self.a & m == 0);
            }
            Op::Cmp => {
                let v = self.read8(mem, addr);
                self.compare(self.a, v);
            }
            Op::Cpx => {
                let v = self.read8(mem, addr);
                self.compare(self.x, v);
            }
            Op::Cpy => {
                let v = self.read8(mem, addr);
                self.compare(self.y, v);
            }

            Op::Bcc => self.branch(addr, !self.p.contains(P::CARRY)),
            Op::Bcs => self.branch(addr, self.p.contains(P::CARRY)),
            Op::Beq => self.branch(addr, self.p.contains(P::ZERO)),
            Op::Bne => self.branch(addr, !self.p.contains(P::ZERO)),
            Op::Bmi => self.branch(addr, self.p.contains(P::NEGATIVE)),
            Op::Bpl => self.branch(addr, !self.p.contains(P::NEGATIVE)),
            Op::Bvc => self.branch(addr, !self.p.contains(P::OVERFLOW)),
            Op::Bvs => self.branch(addr, self.p.contains(P::OVERFLOW)),

            Op::Brk => {
                // The byte after BRK is padding and gets skipped on return
                self.push16(mem, self.pc.wrapping_add(1));
                self.push8(mem, (self.p | P::_5 | P::B).bits());
                self.p |= P::INTERRUPT_DISABLE;
                self.pc = self.read_mem16(mem, IRQ_VECTOR);
            }
            Op::Jmp => self.pc = addr.mem(),
            Op::Jsr => {
                self.push16(mem, self.pc.wrapping_sub(1));
                self.pc = addr.mem();
            }
            Op::Rts => {
                self.pc = self.pop16(mem).wrapping_add(1);
            }
            Op::Rti => {
                let p = self.pop8(mem);
                self.set_p_from_stack(p);
                self.pc = self.pop16(mem);
            }

            Op::Clc => self.p.remove(P::CARRY),
            Op::Cld => self.p.remove(P::DECIMAL),
            Op::Cli => self.p.remove(P::INTERRUPT_DISABLE),
            Op::Clv => self.p.remove(P::OVERFLOW),
            Op::Sec => self.p.insert(P::CARRY),
            Op::Sed => self.p.insert(P::DECIMAL),
            Op::Sei => self.p.insert(P::INTERRUPT_DISABLE),

            Op::Lda => {
                self.a = self.read8(mem, addr);
                self.update_nz(self.a);
            }
            Op::Ldx => {
                self.x = self.read8(mem, addr);
                self.update_nz(self.x);
            }
            Op::Ldy => {
                self.y = self.read8(mem, addr);
                self.update_nz(self.y);
            }
            Op::Sta => self.write8(mem, addr, self.a),
            Op::Stx => self.write8(mem, addr, self.x),
            Op::Sty => self.write8(mem, addr, self.y),

            Op::Tax => {
                self.x = self.a;
                self.update_nz(self.x);
            }
            Op::Tay => {
                self.y = self.a;
                self.update_nz(self.y);
            }
            Op::Tsx => {
                self.x = self.sp;
                self.update_nz(self.x);
            }
            Op::Txa => {
                self.a = self.x;
                self.update_nz(self.a);
            }
            Op::Txs => self.sp = self.x,
            Op::Tya => {
                self.a = self.y;
                self.update_nz(self.a);
            }
            Op::Inx => {
                self.x = self.x.wrapping_add(1);
                self.update_nz(self.x);
            }
            Op::Iny => {
                self.y = self.y.wrapping_add(1);
                self.update_nz(self.y);
            }
            Op::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.update_nz(self.x);
            }
            Op::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.update_nz(self.y);
            }

            Op::Pha => self.push8(mem, self.a),
            Op::Php => self.push8(mem, (self.p | P::_5 | P::B).bits()),
            Op::Pla => {
                self.a = self.pop8(mem);
                self.update_nz(self.a);
            }
            Op::Plp => {
                let p = self.pop8(mem);
                self.set_p_from_stack(p);
            }

            Op::Nop => {
                // Multi-byte NOPs still perform their read
                if !matches!(addr, Addr::A) {
                    self.read8(mem, addr);
                }
            }

            // Undocumented opcodes
            Op::Lax => {
                let v = self.read8(mem, addr);
                self.a = v;
                self.x = v;
                self.update_nz(v);
            }
            Op::Sax => self.write8(mem, addr, self.a & self.x),
            Op::Dcp => {
                let v = self.read8(mem, addr).wrapping_sub(1);
                self.write8(mem, addr, v);
                self.compare(self.a, v);
            }
            Op::Isc => {
                let v = self.read8(mem, addr).wrapping_add(1);
                self.write8(mem, addr, v);
                self.add(!v);
            }
            Op::Slo => {
                let v = self.modify(mem, addr, Self::asl);
                self.a |= v;
                self.update_nz(self.a);
            }
            Op::Rla => {
                let v = self.modify(mem, addr, Self::rol);
                self.a &= v;
                self.update_nz(self.a);
            }
            Op::Sre => {
                let v = self.modify(mem, addr, Self::lsr);
                self.a ^= v;
                self.update_nz(self.a);
            }
            Op::Rra => {
                let v = self.modify(mem, addr, Self::ror);
                self.add(v);
            }
            Op::Anc => {
                self.a &= self.read8(mem, addr);
                self.update_nz(self.a);
                self.p.set(P::CARRY, self.a & 0x80 != 0);
            }
            Op::Alr => {
                let v = self.a & self.read8(mem, addr);
                self.a = self.lsr(v);
            }
            Op::Arr => {
                let v = self.a & self.read8(mem, addr);
                let carry = self.p.contains(P::CARRY) as u8;
                self.a = (v >> 1) | (carry << 7);
                self.update_nz(self.a);
                self.p.set(P::CARRY, self.a & 0x40 != 0);
                self.p
                    .set(P::OVERFLOW, ((self.a >> 6) ^ (self.a >> 5)) & 1 != 0);
            }
            Op::Axs => {
                let v = self.read8(mem, addr);
                let ax = self.a & self.x;
                self.p.set(P::CARRY, ax >= v);
                self.x = ax.wrapping_sub(v);
                self.update_nz(self.x);
            }
            Op::Las => {
                let v = self.read8(mem, addr) & self.sp;
                self.a = v;
                self.x = v;
                self.sp = v;
                self.update_nz(v);
            }
            Op::Xaa => {
                let v = self.read8(mem, addr);
                self.a = (self.a | 0xEE) & self.x & v;
                self.update_nz(self.a);
            }
            Op::Shx => self.store_high_and(mem, addr, self.x),
            Op::Shy => self.store_high_and(mem, addr, self.y),
            Op::Ahx => self.store_high_and(mem, addr, self.a & self.x),
            Op::Tas => {
                self.sp = self.a & self.x;
                self.store_high_and(mem, addr, self.sp);
            }
            Op::Jam => {
                self.pc = self.pc.wrapping_sub(1);
                self.jammed = true;
                log::warn!("CPU jammed on opcode {opcode:#04x} at {:#06x}", self.pc);
            }
        }

        self.cyc - start_cycle
    }

    /// Non-maskable interrupt, taken regardless of the I flag.
    pub fn nmi<Mem: CpuMemory>(&mut self, mem: &mut Mem) {
        self.interrupt(mem, NMI_VECTOR);
    }

    /// Maskable interrupt, returns whether it was taken.
    pub fn irq<Mem: CpuMemory>(&mut self, mem: &mut Mem) -> bool {
        if self.p.contains(P::INTERRUPT_DISABLE) || self.jammed {
            return false;
        }
        self.interrupt(mem, IRQ_VECTOR);
        true
    }

    fn interrupt<Mem: CpuMemory>(&mut self, mem: &mut Mem, vector: u16) {
        self.push16(mem, self.pc);
        self.push8(mem, ((self.p | P::_5) - P::B).bits());
        self.p |= P::INTERRUPT_DISABLE;
        self.pc = self.read_mem16(mem, vector);
        self.cyc += 7;
    }

    fn set_p_from_stack(&mut self, v: u8) {
        // B and bit 5 only exist on the stack copy
        self.p = (P::from_bits_retain(v) - P::B) | P::_5;
    }

    fn update_nz(&mut self, v: u8) {
        self.p.set(P::ZERO, v == 0);
        self.p.set(P::NEGATIVE, v & 0x80 != 0);
    }

    /// Binary add with carry, subtraction passes the complement. The 2A03 has no decimal mode.
    fn add(&mut self, rhs: u8) {
        let lhs = self.a as u16;
        let rhs = rhs as u16;
        let carry = self.p.contains(P::CARRY) as u16;

        let res = lhs + rhs + carry;
        let res8 = res as u8;

        self.p
            .set(P::OVERFLOW, !(lhs ^ rhs) & (lhs ^ res) & 0x80 != 0);
        self.p.set(P::CARRY, res > 0xFF);
        self.a = res8;
        self.update_nz(res8);
    }

    fn compare(&mut self, r: u8, v: u8) {
        self.p.set(P::CARRY, r >= v);
        self.update_nz(r.wrapping_sub(v));
    }

    fn modify<Mem: CpuMemory>(
        &mut self,
        mem: &mut Mem,
        addr: Addr,
        f: impl FnOnce(&mut Self, u8) -> u8,
    ) -> u8 {
        let v = self.read8(mem, addr);
        let v = f(self, v);
        self.write8(mem, addr, v);
        v
    }

    fn asl(&mut self, v: u8) -> u8 {
        let res = v << 1;
        self.p.set(P::CARRY, v & 0x80 != 0);
        self.update_nz(res);
        res
    }

    fn lsr(&mut self, v: u8) -> u8 {
        let res = v >> 1;
        self.p.set(P::CARRY, v & 0x01 != 0);
        self.update_nz(res);
        res
    }

    fn rol(&mut self, v: u8) -> u8 {
        let res = (v << 1) | self.p.contains(P::CARRY) as u8;
        self.p.set(P::CARRY, v & 0x80 != 0);
        self.update_nz(res);
        res
    }

    fn ror(&mut self, v: u8) -> u8 {
        let res = (v >> 1) | ((self.p.contains(P::CARRY) as u8) << 7);
        self.p.set(P::CARRY, v & 0x01 != 0);
        self.update_nz(res);
        res
    }

    fn branch(&mut self, addr: Addr, cond: bool) {
        let Addr::Rel(d) = addr else {
            return;
        };
        if !cond {
            return;
        }

        let old_pc = self.pc;
        self.pc = self.pc.wrapping_add_signed(d as i16);
        self.cyc += 1;
        if old_pc & 0xFF00 != self.pc & 0xFF00 {
            self.cyc += 1;
        }
    }

    /// The unstable SHx family stores `v & (high byte of the address + 1)`.
    fn store_high_and<Mem: CpuMemory>(&mut self, mem: &mut Mem, addr: Addr, v: u8) {
        let a = addr.mem();
        let high = ((a >> 8) as u8).wrapping_add(1);
        self.write8(mem, Addr::Mem(a), v & high);
    }

    fn push8<Mem: CpuMemory>(&mut self, mem: &mut Mem, v: u8) {
        mem.write(self, 0x0100 + self.sp as u16, v);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn push16<Mem: CpuMemory>(&mut self, mem: &mut Mem, v: u16) {
        let [l, r] = v.to_le_bytes();
        self.push8(mem, r);
        self.push8(mem, l);
    }

    fn pop8<Mem: CpuMemory>(&mut self, mem: &mut Mem) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        mem.read(self, 0x0100 + self.sp as u16)
    }

    fn pop16<Mem: CpuMemory>(&mut self, mem: &mut Mem) -> u16 {
        let l = self.pop8(mem);
        let r = self.pop8(mem);
        u16::from_le_bytes([l, r])
    }
}
