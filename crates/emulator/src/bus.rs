use crate::{
    apu::Apu,
    carts::CartBus,
    controller::Joypads,
    cpu::{Cpu, CpuMemory},
    ppu::Ppu,
};

/// OAM DMA halts the CPU for 513 cycles, plus one when it starts on an odd cycle.
const OAM_DMA_CYCLES: u64 = 513;

/// The CPU address space, assembled from borrowed parts of the machine for each instruction.
pub struct NesCpuBus<'a, 'c> {
    pub ram: &'a mut [u8; 0x800],
    pub ppu: &'a mut Ppu,
    pub apu: &'a mut Apu,
    pub cart: &'a mut CartBus<'c>,
    pub joypads: &'a mut Joypads,
    /// Last value seen on the data bus
    pub open_bus: &'a mut u8,
}

impl<'a, 'c> NesCpuBus<'a, 'c> {
    fn oam_dma(&mut self, cpu: &mut Cpu, page: u8) {
        cpu.cyc += OAM_DMA_CYCLES + (cpu.cyc & 1);

        let base = (page as u16) << 8;
        for i in 0..256 {
            let v = self.read(cpu, base + i);
            self.ppu.write_oam(v);
        }
    }
}

impl<'a, 'c> CpuMemory for NesCpuBus<'a, 'c> {
    fn read(&mut self, _cpu: &mut Cpu, addr: u16) -> u8 {
        let v = match addr {
            0x0000..=0x1FFF => self.ram[addr as usize % 0x800],
            0x2000..=0x3FFF => self.ppu.cpu_read_register(self.cart, addr),
            0x4015 => self.apu.read_status() | (*self.open_bus & 0x20),
            0x4016 => self.joypads.read(0),
            0x4017 => self.joypads.read(1),
            0x4000..=0x401F => *self.open_bus,
            0x4020..=0xFFFF => self.cart.cpu_read(addr).unwrap_or(*self.open_bus),
        };
        *self.open_bus = v;
        v
    }

    fn write(&mut self, cpu: &mut Cpu, addr: u16, v: u8) {
        *self.open_bus = v;
        match addr {
            0x0000..=0x1FFF => self.ram[addr as usize % 0x800] = v,
            0x2000..=0x3FFF => self.ppu.cpu_write_register(self.cart, addr, v),
            0x4014 => self.oam_dma(cpu, v),
            0x4016 => self.joypads.write_strobe(v),
            0x4000..=0x4017 => self.apu.write_register(addr, v),
            0x4018..=0x401F => {
                log::trace!("write {v:#04x} to disabled test register {addr:#06x}");
            }
            0x4020..=0xFFFF => self.cart.cpu_write(addr, v),
        }
    }
}
