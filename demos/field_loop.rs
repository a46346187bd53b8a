use clap::Parser;
use serde::Serialize;
use kharmars::b_flux_ct;
use kharmars::config::Config;
use kharmars::coords::{Coordinates, Loci};
use kharmars::field::Field;
use kharmars::flags::{self, FlagField, InversionStatus};
use kharmars::flux::{self, FluxContext};
use kharmars::fofc;
use kharmars::index_space::{IndexDomain, IndexShape, IndexSpace};
use kharmars::mesh::{BoundaryFlag, MeshBlockData, PackLayout};
use kharmars::message::SingleProcess;
use kharmars::update::{self, SimTime};




/**
 * Advect a weak magnetic field loop through a frozen, uniformly moving
 * fluid on a periodic 2D box, and watch the divergence of B.
 */
#[derive(Debug, Parser)]
#[clap(version = "0.1", author = "J. Zrake <jzrake@clemson.edu>")]
struct Opts {
    #[clap(short = 'n', long, default_value = "64")]
    resolution: usize,

    #[clap(short = 't', long, default_value = "1.0")]
    tfinal: f64,

    #[clap(long, default_value = "0.4")]
    cfl: f64,

    #[clap(long)]
    disable_flux_ct: bool,

    #[clap(short = 'o', long, default_value = "field_loop.cbor")]
    output: String,

    #[clap(short = 'v', long, default_value = "1")]
    verbose: i32,
}




#[derive(Serialize)]


/**
 * What gets written at the end of the run
 */
struct State<'a> {
    time: SimTime,
    config: &'a Config,
    coords: Coordinates,
    prims: &'a Field,
    div_b: &'a Field,
}




// ============================================================================
fn vector_potential(x: f64, y: f64) -> f64 {
    let r = (x * x + y * y).sqrt();
    1e-3 * (0.3 - r).max(0.0)
}

fn velocity() -> [f64; 3] {
    [0.5, 0.25, 0.0]
}

/**
 * Fill the ghost zones of a field from the opposite side of the interior.
 */
fn fill_periodic(field: &mut Field, interior: IndexSpace) {
    let wrap = |n: usize, s: usize, len: usize| s + (n + 2 * len - s) % len;
    let (_, nj, ni) = field.dims();

    for k in interior.kb.iter() {
        for j in 0..nj {
            for i in 0..ni {
                if interior.contains((k, j, i)) {
                    continue;
                }
                let from = (k, wrap(j, interior.jb.s, interior.jb.len()), wrap(i, interior.ib.s, interior.ib.len()));
                let values = field.get_slice(from).to_vec();
                field.get_slice_mut((k, j, i)).copy_from_slice(&values);
            }
        }
    }
}

fn setup(opts: &Opts, config: &Config) -> Result<MeshBlockData, kharmars::error::Error> {
    let n = opts.resolution;
    let shape = IndexShape::new([n, n, 1], 2);
    let coords = Coordinates::cartesian(shape, [-1.0, -1.0, 0.0], [1.0, 1.0, 1.0]);
    let layout = std::sync::Arc::new(PackLayout::mhd(&[])?);
    let mut block = MeshBlockData::new(0, coords, [BoundaryFlag::Periodic; 6], layout);
    let m_p = *block.layout.m_p();
    let (dx, dy) = (coords.dxv(1), coords.dxv(2));
    let a = |j: usize, i: usize| {
        let x = coords.coord(0, j, i, Loci::Corner);
        vector_potential(x[1], x[2])
    };
    let v = velocity();
    let interior = block.bounds(IndexDomain::Interior);

    block.prims.par_for_each_in(&interior, |(_, j, i), p| {
        p[m_p.rho as usize] = 1.0;
        p[m_p.uu as usize] = 1.0;
        p[m_p.u1 as usize..m_p.u1 as usize + 3].copy_from_slice(&v);
        p[m_p.b1 as usize] = (a(j + 1, i) + a(j + 1, i + 1) - a(j, i) - a(j, i + 1)) / (2.0 * dy);
        p[m_p.b1 as usize + 1] = -(a(j, i + 1) + a(j + 1, i + 1) - a(j, i) - a(j + 1, i)) / (2.0 * dx);
        p[m_p.b1 as usize + 2] = 0.0;
    });
    fill_periodic(&mut block.prims, interior);
    prim_to_cons(&mut block, config);
    Ok(block)
}

fn prim_to_cons(block: &mut MeshBlockData, config: &Config) {
    let emhd = config.emhd_parameters();
    let entire = block.bounds(IndexDomain::Entire);
    let MeshBlockData { coords, layout, prims, cons, .. } = block;
    let prims = &*prims;
    let nv = layout.num_vars();
    let ctx = FluxContext {
        coords,
        m_p: layout.m_p(),
        m_u: layout.m_u(),
        gam: config.gamma,
        emhd: &emhd,
    };

    cons.par_for_each_in(&entire, |index, u| {
        let (k, j, i) = index;
        let g = ctx.coords.geometry(k, j, i, Loci::Center);
        let mut f = vec![0.0; nv];
        ctx.face_state(&g, prims.get_slice(index), index, 1, u, &mut f);
    });
}

/**
 * Stand-in for primitive recovery: the fluid is frozen, so only the field is
 * recovered from the conserved variables, after their ghost zones are
 * refilled. Zones whose density went negative are flagged as failed
 * inversions.
 */
fn recover(block: &mut MeshBlockData) {
    let rho = block.layout.m_u().rho as usize;
    let interior = block.bounds(IndexDomain::Interior);
    let MeshBlockData { cons, pflag, .. } = block;
    let cons = &*cons;

    pflag.par_for_each_in(&interior, |index, flag| {
        flag[0] = if cons.get(rho, index) <= 0.0 { InversionStatus::NegRho as i32 as f64 } else { 0.0 };
    });
    fill_periodic(&mut block.cons, interior);
    b_flux_ct::fill_derived(block);
}




// ============================================================================
fn advance(block: &mut MeshBlockData, tm: &mut SimTime, config: &Config, cfl: f64) -> Result<(), kharmars::error::Error> {
    flux::get_fluxes(block, config)?;
    b_flux_ct::compute_flux_ct(block, config);
    tm.dt = flux::estimate_timestep(block, cfl);

    let mut trial = block.clone();
    update::apply_flux_divergence(&mut trial, tm.dt);
    recover(&mut trial);

    if fofc::apply_fofc(block, &trial, config)? > 0 {
        b_flux_ct::compute_flux_ct(block, config);
        update::apply_flux_divergence(block, tm.dt);
        recover(block);
    } else {
        *block = trial;
    }
    tm.advance();
    Ok(())
}




// ============================================================================
fn main() -> Result<(), Box<dyn std::error::Error>> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()?;

    let opts = Opts::parse();
    log::info!("{:?}", opts);

    let config = Config {
        disable_flux_ct: opts.disable_flux_ct,
        verbose: opts.verbose,
        flag_verbose: opts.verbose,
        ..Config::default()
    };
    config.validate()?;

    let mut block = setup(&opts, &config)?;

    let mut tm = SimTime::default();

    while tm.time < opts.tfinal {
        advance(&mut block, &mut tm, &config, opts.cfl)?;
        b_flux_ct::post_step_diagnostics(&tm, &block, &config, &SingleProcess)?;
        flags::report_flags(&block, FlagField::Pflag, &config, &SingleProcess)?;
    }
    b_flux_ct::fill_div_b(&mut block);

    let state = State {
        time: tm,
        config: &config,
        coords: block.coords,
        prims: &block.prims,
        div_b: &block.div_b,
    };
    let file = std::fs::File::create(&opts.output)?;
    let mut buffer = std::io::BufWriter::new(file);
    ciborium::ser::into_writer(&state, &mut buffer).map_err(|e| format!("{:?}", e))?;
    log::info!("wrote {}", opts.output);
    Ok(())
}
