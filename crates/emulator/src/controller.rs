use bitflags::bitflags;

/// Button state of a standard controller, in the order the shift register reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct NesController(u8);

bitflags! {
    impl NesController: u8 {
        const A = 0x01;
        const B = 0x02;
        const SELECT = 0x04;
        const START = 0x08;
        const UP = 0x10;
        const DOWN = 0x20;
        const LEFT = 0x40;
        const RIGHT = 0x80;
    }
}

/// Both controller ports at `$4016`/`$4017`.
#[derive(Debug, Clone, bincode::Encode, bincode::Decode)]
pub struct Joypads {
    pub buttons: [NesController; 2],
    shifters: [u8; 2],
    strobe: bool,
    /// Reads of either port since the start of the current frame
    pub read_count: u32,
}

impl Default for Joypads {
    fn default() -> Self {
        Self::new()
    }
}

impl Joypads {
    pub fn new() -> Self {
        Self {
            buttons: [NesController::empty(); 2],
            shifters: [0; 2],
            strobe: false,
            read_count: 0,
        }
    }

    /// Write to `$4016`, bit 0 is the strobe line shared by both ports.
    pub fn write_strobe(&mut self, v: u8) {
        self.strobe = v & 1 != 0;
        if self.strobe {
            self.latch();
        }
    }

    fn latch(&mut self) {
        self.shifters = [self.buttons[0].bits(), self.buttons[1].bits()];
    }

    /// Read from `$4016` (port 0) or `$4017` (port 1).
    pub fn read(&mut self, port: usize) -> u8 {
        self.read_count += 1;
        if self.strobe {
            self.latch();
        }

        let shifter = &mut self.shifters[port];
        let bit = *shifter & 1;
        // Official controllers report 1 once all eight buttons are shifted out
        *shifter = (*shifter >> 1) | 0x80;

        // The upper bits float to the last byte on the data bus
        bit | 0x40
    }
}
