use basic::mach::{Event, Runtime};

pub fn exec(runtime: &mut Runtime) -> String {
    exec_n(runtime, 5000)
}

pub fn exec_n(runtime: &mut Runtime, cycles: usize) -> String {
    let mut s = String::new();
    let mut prev_running = false;
    loop {
        let event = runtime.execute(cycles);
        match &event {
            Event::Stopped => {
                break;
            }
            Event::Errors(errors) => {
                for error in errors.iter() {
                    s.push_str(&format!("{}\n", error));
                }
            }
            Event::Running => {
                if prev_running {
                    s.push_str(&format!("\n{} Execution cycles exceeded.\n", cycles));
                    break;
                }
            }
            Event::Print(_, ps) => {
                s.push_str(ps);
            }
            Event::Input(prompt) => {
                s.push_str(prompt);
                break;
            }
            Event::Frame => {
                runtime.frame();
            }
            Event::Break(line) => {
                if let Some(line) = line {
                    s.push_str(&format!("Break in {}\n", line));
                }
            }
            Event::List(lines) => {
                for line in lines {
                    s.push_str(&format!("{}\n", line));
                }
            }
            Event::Cls | Event::Mode(_) | Event::Sound { .. } => {}
            Event::Load(_) | Event::Run(_) | Event::Chain { .. } | Event::Save(_) => {
                break;
            }
        }
        prev_running = matches!(event, Event::Running);
    }
    s
}
