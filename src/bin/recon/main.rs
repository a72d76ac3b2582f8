mod cli;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use ncsense::{select_dims, FFT_FLAGS, MAPS_FLAG};
use ncsense::cg::{CgConf, CgSolver, StopReason};
use ncsense::config::read_config_file;
use ncsense::io::cfl::{load_cfl, write_cfl};
use ncsense::linop::LinOp;
use ncsense::nufft::NufftConf;
use ncsense::sense::sense_model;

use cli::Cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let file = args.config.as_deref()
        .map(read_config_file)
        .transpose()?
        .unwrap_or_default();
    let conf = CgConf {
        max_iter : args.iterations.unwrap_or(file.iterations),
        l2lambda : args.l2        .unwrap_or(file.l2),
        tolerance: args.tolerance .unwrap_or(file.tolerance),
    };

    let traj = load_cfl(&args.trajectory)?;
    let ksp  = load_cfl(&args.rawdata)?;
    let sens = load_cfl(&args.sens)?;

    // The reconstructed image dimensions are [X, Y, Z, 1, M]
    let img_dims = select_dims(FFT_FLAGS | MAPS_FLAG, &sens.dims());

    println!("Non-Cartesian CG-SENSE Reconstruction");
    println!("k-space {:?}, image {:?}, {} iterations, lambda {}",
             &ksp.dims()[..5], &img_dims[..5], conf.max_iter, conf.l2lambda);

    // A = F·S, with the memory-efficient normal evaluation
    let model = sense_model(sens, ksp.dims(), &traj, NufftConf { lowmem: true })?;

    // right-hand side of the normal equations: the adjoint reconstruction
    let b = model.adjoint(&ksp)?;

    // seed with b itself, i.e. start from the adjoint reconstruction
    let mut solver = CgSolver::new(&conf, &model, &b, None)?;
    let progress = ProgressBar::new(conf.max_iter as u64)
        .with_style(ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")?);
    for step in &mut solver {
        let step = step?;
        progress.set_message(format!("residual {:.3e}", step.residual));
        progress.inc(1);
    }
    progress.finish_and_clear();

    let solution = solver.into_solution();
    match solution.stop {
        StopReason::Breakdown { iteration } =>
            eprintln!("CG broke down at iteration {iteration}; writing the estimate reached so far"),
        _ =>
            println!("stopped after {} iterations with relative residual {:.3e}",
                     solution.iterations, solution.residual),
    }

    write_cfl(&args.output, &solution.image)?;
    println!("Reconstruction written to {:?}", args.output);

    Ok(())
}
