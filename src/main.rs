use clap::Parser;
use sora_imagegen_tool::{hello, GreetArgs};

fn main() {
    let args = GreetArgs::parse();
    println!("{}", hello(&args.name));
}
