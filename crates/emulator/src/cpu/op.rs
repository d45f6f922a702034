#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    // Undocumented opcodes
    Ahx,
    Alr,
    Anc,
    Arr,
    Axs,
    Dcp,
    Isc,
    Jam,
    Las,
    Lax,
    Rla,
    Rra,
    Sax,
    Shx,
    Shy,
    Slo,
    Sre,
    Tas,
    Xaa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// Implied or accumulator, no operand
    Imp,
    /// Operand at `pc + 1`
    Imm,
    /// Address `fetch8()`
    Zp0,
    /// Address `(fetch8() + x) & 0xFF`
    ZpX,
    /// Address `(fetch8() + y) & 0xFF`
    ZpY,
    /// Address `fetch16()`
    Abs,
    /// Address `fetch16() + x`
    AbX,
    /// Address `fetch16() + y`
    AbY,
    /// Signed displacement `fetch8()` from the next instruction
    Rel,
    /// Address `mem16_pw(fetch16())`
    ///
    /// The pointer wraps inside its page, see `Cpu::read_mem16_pw`
    Ind,
    /// Address `mem16_pw((fetch8() + x) & 0xFF)`
    IdX,
    /// Address `mem16_pw(fetch8()) + y`
    IdY,
}

/// One decoded opcode.
#[derive(Debug, Clone, Copy)]
pub struct Instr {
    pub op: Op,
    pub mode: AddrMode,
    /// Base cycle count
    pub cycles: u8,
    /// Reads cost one extra cycle when the indexed address crosses a page
    pub page_penalty: bool,
}

const fn i(op: Op, mode: AddrMode, cycles: u8, page_penalty: bool) -> Instr {
    Instr {
        op,
        mode,
        cycles,
        page_penalty,
    }
}

/// Decoding table for all 256 opcodes, row `n` holds opcodes `$n0` to `$nF`.
pub const OPCODES: [Instr; 256] = {
    use AddrMode::*;
    use Op::*;

    const T: bool = true;
    const F: bool = false;

    #[rustfmt::skip]
    let table = [
        // 0x
        i(Brk, Imp, 7, F), i(Ora, IdX, 6, F), i(Jam, Imp, 2, F), i(Slo, IdX, 8, F),
        i(Nop, Zp0, 3, F), i(Ora, Zp0, 3, F), i(Asl, Zp0, 5, F), i(Slo, Zp0, 5, F),
        i(Php, Imp, 3, F), i(Ora, Imm, 2, F), i(Asl, Imp, 2, F), i(Anc, Imm, 2, F),
        i(Nop, Abs, 4, F), i(Ora, Abs, 4, F), i(Asl, Abs, 6, F), i(Slo, Abs, 6, F),
        // 1x
        i(Bpl, Rel, 2, F), i(Ora, IdY, 5, T), i(Jam, Imp, 2, F), i(Slo, IdY, 8, F),
        i(Nop, ZpX, 4, F), i(Ora, ZpX, 4, F), i(Asl, ZpX, 6, F), i(Slo, ZpX, 6, F),
        i(Clc, Imp, 2, F), i(Ora, AbY, 4, T), i(Nop, Imp, 2, F), i(Slo, AbY, 7, F),
        i(Nop, AbX, 4, T), i(Ora, AbX, 4, T), i(Asl, AbX, 7, F), i(Slo, AbX, 7, F),
        // 2x
        i(Jsr, Abs, 6, F), i(And, IdX, 6, F), i(Jam, Imp, 2, F), i(Rla, IdX, 8, F),
        i(Bit, Zp0, 3, F), i(And, Zp0, 3, F), i(Rol, Zp0, 5, F), i(Rla, Zp0, 5, F),
        i(Plp, Imp, 4, F), i(And, Imm, 2, F), i(Rol, Imp, 2, F), i(Anc, Imm, 2, F),
        i(Bit, Abs, 4, F), i(And, Abs, 4, F), i(Rol, Abs, 6, F), i(Rla, Abs, 6, F),
        // 3x
        i(Bmi, Rel, 2, F), i(And, IdY, 5, T), i(Jam, Imp, 2, F), i(Rla, IdY, 8, F),
        i(Nop, ZpX, 4, F), i(And, ZpX, 4, F), i(Rol, ZpX, 6, F), i(Rla, ZpX, 6, F),
        i(Sec, Imp, 2, F), i(And, AbY, 4, T), i(Nop, Imp, 2, F), i(Rla, AbY, 7, F),
        i(Nop, AbX, 4, T), i(And, AbX, 4, T), i(Rol, AbX, 7, F), i(Rla, AbX, 7, F),
        // 4x
        i(Rti, Imp, 6, F), i(Eor, IdX, 6, F), i(Jam, Imp, 2, F), i(Sre, IdX, 8, F),
        i(Nop, Zp0, 3, F), i(Eor, Zp0, 3, F), i(Lsr, Zp0, 5, F), i(Sre, Zp0, 5, F),
        i(Pha, Imp, 3, F), i(Eor, Imm, 2, F), i(Lsr, Imp, 2, F), i(Alr, Imm, 2, F),
        i(Jmp, Abs, 3, F), i(Eor, Abs, 4, F), i(Lsr, Abs, 6, F), i(Sre, Abs, 6, F),
        // 5x
        i(Bvc, Rel, 2, F), i(Eor, IdY, 5, T), i(Jam, Imp, 2, F), i(Sre, IdY, 8, F),
        i(Nop, ZpX, 4, F), i(Eor, ZpX, 4, F), i(Lsr, ZpX, 6, F), i(Sre, ZpX, 6, F),
        i(Cli, Imp, 2, F), i(Eor, AbY, 4, T), i(Nop, Imp, 2, F), i(Sre, AbY, 7, F),
        i(Nop, AbX, 4, T), i(Eor, AbX, 4, T), i(Lsr, AbX, 7, F), i(Sre, AbX, 7, F),
        // 6x
        i(Rts, Imp, 6, F), i(Adc, IdX, 6, F), i(Jam, Imp, 2, F), i(Rra, IdX, 8, F),
        i(Nop, Zp0, 3, F), i(Adc, Zp0, 3, F), i(Ror, Zp0, 5, F), i(Rra, Zp0, 5, F),
        i(Pla, Imp, 4, F), i(Adc, Imm, 2, F), i(Ror, Imp, 2, F), i(Arr, Imm, 2, F),
        i(Jmp, Ind, 5, F), i(Adc, Abs, 4, F), i(Ror, Abs, 6, F), i(Rra, Abs, 6, F),
        // 7x
        i(Bvs, Rel, 2, F), i(Adc, IdY, 5, T), i(Jam, Imp, 2, F), i(Rra, IdY, 8, F),
        i(Nop, ZpX, 4, F), i(Adc, ZpX, 4, F), i(Ror, ZpX, 6, F), i(Rra, ZpX, 6, F),
        i(Sei, Imp, 2, F), i(Adc, AbY, 4, T), i(Nop, Imp, 2, F), i(Rra, AbY, 7, F),
        i(Nop, AbX, 4, T), i(Adc, AbX, 4, T), i(Ror, AbX, 7, F), i(Rra, AbX, 7, F),
        // 8x
        i(Nop, Imm, 2, F), i(Sta, IdX, 6, F), i(Nop, Imm, 2, F), i(Sax, IdX, 6, F),
        i(Sty, Zp0, 3, F), i(Sta, Zp0, 3, F), i(Stx, Zp0, 3, F), i(Sax, Zp0, 3, F),
        i(Dey, Imp, 2, F), i(Nop, Imm, 2, F), i(Txa, Imp, 2, F), i(Xaa, Imm, 2, F),
        i(Sty, Abs, 4, F), i(Sta, Abs, 4, F), i(Stx, Abs, 4, F), i(Sax, Abs, 4, F),
        // 9x
        i(Bcc, Rel, 2, F), i(Sta, IdY, 6, F), i(Jam, Imp, 2, F), i(Ahx, IdY, 6, F),
        i(Sty, ZpX, 4, F), i(Sta, ZpX, 4, F), i(Stx, ZpY, 4, F), i(Sax, ZpY, 4, F),
        i(Tya, Imp, 2, F), i(Sta, AbY, 5, F), i(Txs, Imp, 2, F), i(Tas, AbY, 5, F),
        i(Shy, AbX, 5, F), i(Sta, AbX, 5, F), i(Shx, AbY, 5, F), i(Ahx, AbY, 5, F),
        // Ax
        i(Ldy, Imm, 2, F), i(Lda, IdX, 6, F), i(Ldx, Imm, 2, F), i(Lax, IdX, 6, F),
        i(Ldy, Zp0, 3, F), i(Lda, Zp0, 3, F), i(Ldx, Zp0, 3, F), i(Lax, Zp0, 3, F),
        i(Tay, Imp, 2, F), i(Lda, Imm, 2, F), i(Tax, Imp, 2, F), i(Lax, Imm, 2, F),
        i(Ldy, Abs, 4, F), i(Lda, Abs, 4, F), i(Ldx, Abs, 4, F), i(Lax, Abs, 4, F),
        // Bx
        i(Bcs, Rel, 2, F), i(Lda, IdY, 5, T), i(Jam, Imp, 2, F), i(Lax, IdY, 5, T),
        i(Ldy, ZpX, 4, F), i(Lda, ZpX, 4, F), i(Ldx, ZpY, 4, F), i(Lax, ZpY, 4, F),
        i(Clv, Imp, 2, F), i(Lda, AbY, 4, T), i(Tsx, Imp, 2, F), i(Las, AbY, 4, T),
        i(Ldy, AbX, 4, T), i(Lda, AbX, 4, T), i(Ldx, AbY, 4, T), i(Lax, AbY, 4, T),
        // Cx
        i(Cpy, Imm, 2, F), i(Cmp, IdX, 6, F), i(Nop, Imm, 2, F), i(Dcp, IdX, 8, F),
        i(Cpy, Zp0, 3, F), i(Cmp, Zp0, 3, F), i(Dec, Zp0, 5, F), i(Dcp, Zp0, 5, F),
        i(Iny, Imp, 2, F), i(Cmp, Imm, 2, F), i(Dex, Imp, 2, F), i(Axs, Imm, 2, F),
        i(Cpy, Abs, 4, F), i(Cmp, Abs, 4, F), i(Dec, Abs, 6, F), i(Dcp, Abs, 6, F),
        // Dx
        i(Bne, Rel, 2, F), i(Cmp, IdY, 5, T), i(Jam, Imp, 2, F), i(Dcp, IdY, 8, F),
        i(Nop, ZpX, 4, F), i(Cmp, ZpX, 4, F), i(Dec, ZpX, 6, F), i(Dcp, ZpX, 6, F),
        i(Cld, Imp, 2, F), i(Cmp, AbY, 4, T), i(Nop, Imp, 2, F), i(Dcp, AbY, 7, F),
        i(Nop, AbX, 4, T), i(Cmp, AbX, 4, T), i(Dec, AbX, 7, F), i(Dcp, AbX, 7, F),
        // Ex
        i(Cpx, Imm, 2, F), i(Sbc, IdX, 6, F), i(Nop, Imm, 2, F), i(Isc, IdX, 8, F),
        i(Cpx, Zp0, 3, F), i(Sbc, Zp0, 3, F), i(Inc, Zp0, 5, F), i(Isc, Zp0, 5, F),
        i(Inx, Imp, 2, F), i(Sbc, Imm, 2, F), i(Nop, Imp, 2, F), i(Sbc, Imm, 2, F),
        i(Cpx, Abs, 4, F), i(Sbc, Abs, 4, F), i(Inc, Abs, 6, F), i(Isc, Abs, 6, F),
        // Fx
        i(Beq, Rel, 2, F), i(Sbc, IdY, 5, T), i(Jam, Imp, 2, F), i(Isc, IdY, 8, F),
        i(Nop, ZpX, 4, F), i(Sbc, ZpX, 4, F), i(Inc, ZpX, 6, F), i(Isc, ZpX, 6, F),
        i(Sed, Imp, 2, F), i(Sbc, AbY, 4, T), i(Nop, Imp, 2, F), i(Isc, AbY, 7, F),
        i(Nop, AbX, 4, T), i(Sbc, AbX, 4, T), i(Inc, AbX, 7, F), i(Isc, AbX, 7, F),
    ];
    table
};
