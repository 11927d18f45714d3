use crate::machine::{Machine, MachineState, TEXT_BASE};
use crate::SimError;
use log::trace;
use mipc_codegen::{syscall, AsmInst, Reg};

impl Machine<'_> {
    pub(crate) fn execute_instruction(&mut self, inst: &AsmInst) -> Result<(), SimError> {
        let mut next = self.pc + 1;
        match inst {
            AsmInst::Label(_) | AsmInst::Comment(_) => {}

            AsmInst::Add(rd, rs, rt) => {
                let value = self.reg(*rs).wrapping_add(self.reg(*rt));
                self.set_reg(*rd, value as u32);
            }
            AsmInst::Sub(rd, rs, rt) => {
                let value = self.reg(*rs).wrapping_sub(self.reg(*rt));
                self.set_reg(*rd, value as u32);
            }
            AsmInst::AddI(rd, rs, imm) => {
                let value = self.reg(*rs).wrapping_add(*imm);
                self.set_reg(*rd, value as u32);
            }
            AsmInst::Mult(rs, rt) => {
                let product = self.reg(*rs) as i64 * self.reg(*rt) as i64;
                self.lo = product as u32;
                self.hi = (product >> 32) as u32;
            }
            AsmInst::Div(rs, rt) => {
                let divisor = self.reg(*rt);
                if divisor == 0 {
                    return Err(SimError::DivisionByZero { pc: self.pc });
                }
                let dividend = self.reg(*rs);
                self.lo = dividend.wrapping_div(divisor) as u32;
                self.hi = dividend.wrapping_rem(divisor) as u32;
            }
            AsmInst::Mflo(rd) => self.set_reg(*rd, self.lo),
            AsmInst::Sll(rd, rs, shamt) => {
                let value = (self.reg(*rs) as u32).wrapping_shl(*shamt as u32);
                self.set_reg(*rd, value);
            }
            AsmInst::Li(rd, imm) => self.set_reg(*rd, *imm as u32),
            AsmInst::Move(rd, rs) => self.set_reg(*rd, self.reg(*rs) as u32),

            AsmInst::Lw(rt, addr) | AsmInst::Ls(rt, addr) => {
                let addr = self.address(addr)?;
                let value = self.load_word(addr);
                self.set_reg(*rt, value);
            }
            AsmInst::Sw(rt, addr) | AsmInst::Ss(rt, addr) => {
                let addr = self.address(addr)?;
                let value = self.reg(*rt) as u32;
                self.store_word(addr, value);
            }

            AsmInst::AddS(fd, fs, ft) => self.set_float(*fd, self.float_reg(*fs) + self.float_reg(*ft)),
            AsmInst::SubS(fd, fs, ft) => self.set_float(*fd, self.float_reg(*fs) - self.float_reg(*ft)),
            AsmInst::MulS(fd, fs, ft) => self.set_float(*fd, self.float_reg(*fs) * self.float_reg(*ft)),
            AsmInst::DivS(fd, fs, ft) => self.set_float(*fd, self.float_reg(*fs) / self.float_reg(*ft)),
            AsmInst::MovS(fd, fs) => self.set_float(*fd, self.float_reg(*fs)),
            AsmInst::Mtc1(rt, fs) => self.set_reg(*fs, self.reg(*rt) as u32),
            AsmInst::Mfc1(rt, fs) => self.set_reg(*rt, self.reg(*fs) as u32),
            AsmInst::CvtSW(fd, fs) => {
                let int = self.reg(*fs);
                self.set_float(*fd, int as f32);
            }
            AsmInst::TruncWS(fd, fs) => {
                let int = self.float_reg(*fs).trunc() as i32;
                self.set_reg(*fd, int as u32);
            }

            AsmInst::Jal(label) => {
                let target = self.label_index(label)?;
                self.set_reg(Reg::Ra, TEXT_BASE + 4 * next as u32);
                next = target;
            }
            AsmInst::Jr(rs) => {
                let addr = self.reg(*rs) as u32;
                let offset = addr.wrapping_sub(TEXT_BASE);
                let target = (offset / 4) as usize;
                if addr < TEXT_BASE || offset % 4 != 0 || target > self.program.text.len() {
                    return Err(SimError::BadJump(addr));
                }
                next = target;
            }
            AsmInst::Syscall => self.syscall()?,
        }
        self.pc = next;
        Ok(())
    }

    fn syscall(&mut self) -> Result<(), SimError> {
        let code = self.reg(Reg::V0);
        trace!("syscall {}", code);
        match code {
            syscall::PRINT_INT => {
                let value = self.reg(Reg::A0);
                self.output.push_str(&value.to_string());
            }
            syscall::PRINT_FLOAT => {
                let value = self.float_reg(Reg::FLOAT_PRINT_ARG);
                self.output.push_str(&value.to_string());
            }
            syscall::EXIT => self.state = MachineState::Halted,
            syscall::PRINT_CHAR => {
                let byte = (self.reg(Reg::A0) & 0xff) as u8;
                self.output.push(byte as char);
            }
            other => return Err(SimError::UnknownSyscall(other)),
        }
        Ok(())
    }
}
