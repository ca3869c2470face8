//! Output writer (C9): the four per-chromosome candidate/report files under
//! `1_candidates/<chr>/`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::candidates::{CandidateRegion, RegionArena, SvType};
use crate::errors::{DetectError, Result};
use crate::genome::MateClipRegion;
use crate::window::MisAlignReg;

pub struct CandidateSink {
    out_dir: PathBuf,
}

impl CandidateSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        CandidateSink { out_dir: out_dir.into() }
    }

    fn chrom_dir(&self, chrname: &str) -> PathBuf {
        self.out_dir.join("1_candidates").join(chrname)
    }

    fn open(&self, chrname: &str, suffix: &str) -> Result<BufWriter<File>> {
        let dir = self.chrom_dir(chrname);
        fs::create_dir_all(&dir).map_err(|e| DetectError::IoFailure {
            function: "CandidateSink::open",
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = dir.join(format!("{}_{}", chrname, suffix));
        let file = File::create(&path).map_err(|e| DetectError::IoFailure {
            function: "CandidateSink::open",
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(BufWriter::new(file))
    }

    pub fn write_indel_candidates(&self, chrname: &str, regions: &[CandidateRegion]) -> Result<()> {
        let mut w = self.open(chrname, "INDEL_candidate")?;
        for r in regions {
            write_io(&mut w, &format!("{}\t{}\t{}\n", r.chrname, r.start_ref_pos, r.end_ref_pos))?;
        }
        Ok(())
    }

    pub fn write_snv_candidates(&self, chrname: &str, positions: &[i64]) -> Result<()> {
        let mut w = self.open(chrname, "SNV_candidate")?;
        for p in positions {
            write_io(&mut w, &format!("{}\t{}\n", chrname, p))?;
        }
        Ok(())
    }

    pub fn write_clip_candidates(&self, chrname: &str, arena: &RegionArena, mates: &[MateClipRegion]) -> Result<()> {
        let mut w = self.open(chrname, "clipReg_candidate")?;
        for m in mates {
            let (chr1, ls1, le1) = side_fields(arena, m.left);
            let (chr2, ls2, le2) = side_fields(arena, m.right);
            let mated_flag = if m.reg_mated_flag { "1" } else { "0" };
            let dup_num = if m.sv_type == SvType::Dup { m.dup_num.to_string() } else { "-".to_string() };
            write_io(
                &mut w,
                &format!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t####\t{}\t{}\t{}\t{}\t{}\t{}\n",
                    chr1,
                    ls1,
                    le1,
                    chr2,
                    ls2,
                    le2,
                    mated_flag,
                    m.left_mean_clip_pos,
                    m.right_mean_clip_pos,
                    sv_type_str(m.sv_type),
                    dup_num,
                    m.left_clip_pos_num,
                    m.right_clip_pos_num,
                ),
            )?;
        }
        Ok(())
    }

    /// Opens the chromosome's mis-align report for incremental, append-only
    /// writes shared across concurrently running blocks.
    pub fn open_misaln_writer(&self, chrname: &str) -> Result<BufWriter<File>> {
        self.open(chrname, "misaln_reg")
    }
}

pub fn append_misaln_regions(writer: &mut dyn Write, chrname: &str, regions: &[MisAlignReg]) -> Result<()> {
    for r in regions {
        write_io(writer, &format!("{}\t{}\t{}\t{:.3}\t{}\n", chrname, r.start_r_pos, r.end_r_pos, r.disagr_reg_ratio, r.high_clip_base_count))?;
    }
    Ok(())
}

fn side_fields(arena: &RegionArena, id: Option<crate::candidates::RegionId>) -> (String, String, String) {
    match id {
        Some(id) => {
            let r = arena.get(id);
            (r.chrname.clone(), r.start_ref_pos.to_string(), r.end_ref_pos.to_string())
        }
        None => ("-".to_string(), "-".to_string(), "-".to_string()),
    }
}

fn sv_type_str(sv_type: SvType) -> &'static str {
    match sv_type {
        SvType::Uncertain => "UNC",
        SvType::Ins => "INS",
        SvType::Del => "DEL",
        SvType::Dup => "DUP",
        SvType::Inv => "INV",
        SvType::Tra => "TRA",
        SvType::Bnd => "BND",
        SvType::Mix => "MIX",
    }
}

fn write_io(w: &mut dyn Write, s: &str) -> Result<()> {
    w.write_all(s.as_bytes()).map_err(|e| DetectError::IoFailure { function: "sink::write_io", path: String::new(), source: e })
}

pub fn ensure_out_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| DetectError::IoFailure { function: "ensure_out_dir", path: path.display().to_string(), source: e })
}
