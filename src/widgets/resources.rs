// CPU and memory usage panel

use std::collections::VecDeque;
use std::sync::Mutex;
use sysinfo::System;

use crate::engine::widget::{Widget, WidgetBase};

const HISTORY: usize = 30;
const BAR_WIDTH: usize = 20;

struct Sampler {
    system: System,
    cpu_history: VecDeque<u64>,
}

pub struct ResourcesWidget {
    base: WidgetBase,
    sampler: Mutex<Sampler>,
}

impl ResourcesWidget {
    pub fn new(base: WidgetBase) -> Self {
        Self {
            base,
            sampler: Mutex::new(Sampler {
                system: System::new(),
                cpu_history: VecDeque::with_capacity(HISTORY),
            }),
        }
    }

    fn sample(&self) -> Vec<String> {
        let mut sampler = self.sampler.lock().unwrap_or_else(|e| e.into_inner());

        sampler.system.refresh_cpu();
        sampler.system.refresh_memory();

        let cpu_usage = sampler.system.global_cpu_info().cpu_usage() as u64;
        let total_mem = sampler.system.total_memory();
        let used_mem = sampler.system.used_memory();
        let mem_usage = percent(used_mem, total_mem);

        if sampler.cpu_history.len() >= HISTORY {
            sampler.cpu_history.pop_front();
        }
        sampler.cpu_history.push_back(cpu_usage);

        let load = System::load_average();
        let avg_cpu = sampler.cpu_history.iter().sum::<u64>() / sampler.cpu_history.len() as u64;

        vec![
            format!("CPU {} {:>3}%", bar(cpu_usage), cpu_usage),
            format!("MEM {} {:>3}%", bar(mem_usage), mem_usage),
            format!(
                "    {} / {}",
                format_bytes(used_mem),
                format_bytes(total_mem)
            ),
            format!("avg cpu {}% over {} samples", avg_cpu, sampler.cpu_history.len()),
            format!("load {:.2} {:.2} {:.2}", load.one, load.five, load.fifteen),
        ]
    }
}

impl Widget for ResourcesWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn refresh(&self) {
        let lines = self.sample();
        self.base.display(lines);
    }
}

fn percent(used: u64, total: u64) -> u64 {
    if total > 0 {
        ((used as f64 / total as f64) * 100.0) as u64
    } else {
        0
    }
}

fn bar(pct: u64) -> String {
    let filled = (pct.min(100) as usize * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), " ".repeat(BAR_WIDTH - filled))
}

fn format_bytes(bytes: u64) -> String {
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= GIB {
        format!("{:.1} GiB", b / GIB)
    } else {
        format!("{:.0} MiB", b / MIB)
    }
}
