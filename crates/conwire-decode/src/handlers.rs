//! Built-in struct handlers for the structured blobs the firmware prints
//! through the console channel: register dumps, the task table, the shared
//! memory table, and a few smaller helpers.
//!
//! Struct type ids match the firmware's enumeration. Each handler checks the
//! blob length first and falls back to the placeholder rendering on a
//! mismatch rather than guessing at field offsets.

use crate::registry::StructRegistry;

/// Machine scratch register dump (16 words).
pub const STRUCT_SCRATCH_REGS: u16 = 1;
/// RISC-V exception frame (42 words).
pub const STRUCT_EXCEPTION_FRAME: u16 = 2;
/// Coverage counter dump (u64 array).
pub const STRUCT_COVERAGE_COUNTERS: u16 = 3;
/// One row of the task table.
pub const STRUCT_TASK_ENTRY: u16 = 4;
/// One row of the shared-memory table.
pub const STRUCT_SHMEM_ENTRY: u16 = 5;
/// A bare 64-bit pointer.
pub const STRUCT_PTR64: u16 = 6;

/// Register every built-in handler.
pub fn register_builtins(registry: &mut StructRegistry) {
    registry.register(STRUCT_SCRATCH_REGS, scratch_regs);
    registry.register(STRUCT_EXCEPTION_FRAME, exception_frame);
    registry.register(STRUCT_COVERAGE_COUNTERS, coverage_counters);
    registry.register(STRUCT_TASK_ENTRY, task_entry);
    registry.register(STRUCT_SHMEM_ENTRY, shmem_entry);
    registry.register(STRUCT_PTR64, ptr64);
}

fn bad_struct(stype: u16, buf: &[u8]) -> String {
    format!("BadStruct#{stype}({})", buf.len())
}

fn words_le(buf: &[u8]) -> Vec<u32> {
    buf.chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect()
}

fn scratch_regs(stype: u16, buf: &[u8]) -> String {
    if buf.len() != 64 {
        return bad_struct(stype, buf);
    }
    let regs = words_le(buf);
    let mut out = String::from("\n");
    for row in 0..4 {
        let i = row * 4;
        out.push_str(&format!(
            "gen{:02}-{:02}  {:08x} {:08x} {:08x} {:08x}\n",
            i,
            i + 3,
            regs[i],
            regs[i + 1],
            regs[i + 2],
            regs[i + 3]
        ));
    }
    out
}

fn mcause_desc(mcause: u32) -> &'static str {
    match mcause {
        0 => "Instruction address misaligned",
        1 => "Instruction access fault",
        2 => "Illegal instruction",
        3 => "Breakpoint",
        4 => "Load address misaligned",
        5 => "Load access fault",
        6 => "Store/AMO address misaligned",
        7 => "Store/AMO access fault",
        8 => "Environment call from U-mode",
        9 => "Environment call from S-mode",
        10 => "NMI",
        11 => "Environment call from M-mode",
        12 => "Instruction page fault",
        13 => "Load page fault",
        14 => "Reserved",
        15 => "Store/AMO page fault",
        48 => "Watchdog",
        _ => "?",
    }
}

fn exception_frame(stype: u16, buf: &[u8]) -> String {
    const NAMES: [&str; 42] = [
        "gp", "tp", "sp", "mcause", "mepc", "mtval", "mstatus", "mscratch", "mie", "mip", "mtvec",
        "mnmivec", "trapflgs", "reserved0", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8",
        "s9", "s10", "s11", "t0", "t1", "t2", "t3", "t4", "t5", "t6", "a0", "a1", "a2", "a3", "a4",
        "a5", "a6", "a7", "ra",
    ];
    const LINES: [&[&str]; 12] = [
        &["s0", "gp", "mstatus", "mie"],
        &["s1", "ra", "mepc", "mip"],
        &["s2", "sp", "mtvec", "mnmivec"],
        &["s3", "tp", "mtval", "mscratch"],
        &["s4", "a0", "t0", "trapflgs"],
        &["s5", "a1", "t1"],
        &["s6", "a2", "t2"],
        &["s7", "a3", "t3"],
        &["s8", "a4", "t4"],
        &["s9", "a5", "t5"],
        &["s10", "a6", "t6"],
        &["s11", "a7"],
    ];
    const WIDTHS: [usize; 4] = [3, 3, 7, 8];

    if buf.len() != NAMES.len() * 4 {
        return bad_struct(stype, buf);
    }
    let values = words_le(buf);
    let reg = |name: &str| -> u32 {
        NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| values[i])
            .unwrap_or(0)
    };

    let mode = if reg("mstatus") & (3 << 11) != 0 { 'M' } else { 'U' };
    let mcause = reg("mcause");
    let mut out = format!("{mode}-MODE EXCEPTION {mcause:08x}: {}\n", mcause_desc(mcause));

    for line in LINES {
        let cells: Vec<String> = line
            .iter()
            .copied()
            .zip(WIDTHS)
            .map(|(name, width)| format!("{name:<width$} {:08x}", reg(name)))
            .collect();
        out.push_str(&cells.join("    "));
        out.push('\n');
    }
    out
}

fn coverage_counters(stype: u16, buf: &[u8]) -> String {
    if buf.is_empty() || buf.len() % 8 != 0 {
        return bad_struct(stype, buf);
    }
    buf.chunks_exact(8)
        .map(|c| {
            u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]).to_string()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn task_entry(stype: u16, buf: &[u8]) -> String {
    // flags, events, events_enabled, events_async_enabled (u32), wake_time
    // (u64), mepc, msg_head, msg_tail, msg_queue_mask (u32), name[16].
    if buf.len() != 56 {
        return bad_struct(stype, buf);
    }
    let head = words_le(&buf[..16]);
    let (flags, events, events_enabled, events_async_enabled) =
        (head[0], head[1], head[2], head[3]);
    let wake_time = u64::from_le_bytes([
        buf[16], buf[17], buf[18], buf[19], buf[20], buf[21], buf[22], buf[23],
    ]);
    let tail = words_le(&buf[24..40]);
    let (mepc, msg_head, msg_tail, msg_queue_mask) = (tail[0], tail[1], tail[2], tail[3]);
    let name_bytes = &buf[40..56];
    let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(16);
    let name = String::from_utf8_lossy(&name_bytes[..name_end]);

    let mut out = String::new();
    out.push(if flags & (1 << 0) != 0 { 'R' } else { 's' });
    out.push(if flags & (1 << 1) != 0 { 'T' } else { '.' });
    out.push_str(&format!(
        " {mepc:08x} {events:08x} {events_enabled:08x} {events_async_enabled:08x}"
    ));
    out.push_str(&format!(
        " {msg_head:04x} {msg_tail:04x} {msg_queue_mask:04x}"
    ));
    if wake_time == u64::MAX {
        out.push_str("     (FOREVER)");
    } else {
        out.push_str(&format!(
            "{:7}.{:06}",
            wake_time / 1_000_000,
            wake_time % 1_000_000
        ));
    }
    out.push(' ');
    out.push_str(&name);
    out
}

/// Owner value meaning "no owner" in the shared-memory table.
const SHMEM_OWNER_NONE: u8 = 32;

fn shmem_entry(stype: u16, buf: &[u8]) -> String {
    // addr, max_size, allocated_size, allocated_owner_mask, flags (u32),
    // handle, owner, requested_owner, map_count (u8).
    if buf.len() != 24 {
        return bad_struct(stype, buf);
    }
    let words = words_le(&buf[..20]);
    let (addr, max_size, allocated_size, flags) = (words[0], words[1], words[2], words[4]);
    let (handle, owner, requested_owner, map_count) = (buf[20], buf[21], buf[22], buf[23]);

    let mut out = format!("{handle:2} {flags:02x} {addr:08x}");
    out.push_str(&format!(" {allocated_size:6}/{max_size:6} m{map_count}"));
    if owner != SHMEM_OWNER_NONE {
        out.push_str(&format!(" o{owner}"));
    }
    if requested_owner != SHMEM_OWNER_NONE {
        out.push_str(&format!("->{requested_owner}"));
    }
    out
}

fn ptr64(stype: u16, buf: &[u8]) -> String {
    if buf.len() != 8 {
        return bad_struct(stype, buf);
    }
    let v = u64::from_le_bytes([
        buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
    ]);
    format!("0x{v:16x}")
}
