//! End-to-end problem writing: build a small dispatch problem and check the
//! exact LP text, the returned tokens and the reference bookkeeping.

use lpio_write::{linexpr, Axis, Operand, ProblemWriter, RefTable, Sense, TokenKind};
use std::fs;
use std::io::BufWriter;

#[test]
fn two_generator_dispatch_problem() {
    let gens = Axis::new(["coal", "wind"]);
    let snapshots = Axis::new(["t0", "t1"]);

    let mut writer = ProblemWriter::new(Vec::new(), Vec::new());

    // Dispatch variables p(t, g), bounded per generator capacity.
    let p_max = Operand::vector(gens.clone(), vec![100.0, 50.0]).unwrap();
    let p = writer
        .write_bounds(
            &Operand::Scalar(0.0),
            &p_max,
            Some(vec![snapshots.clone(), gens.clone()]),
        )
        .unwrap();
    assert_eq!(p.tokens(), &["x0", "x1", "x2", "x3"]);
    assert_eq!(p.shape().dims(), &[2, 2]);

    // Demand balance per snapshot: total dispatch equals the load. Summing
    // over the generator axis leaves one term group per snapshot.
    let lhs = linexpr(&[(Operand::Scalar(1.0), &p)]).unwrap().join_trailing();
    let load = Operand::vector(snapshots.clone(), vec![80.0, 120.0]).unwrap();
    let balance = writer
        .write_constraints(&lhs, Sense::Eq, &load, None)
        .unwrap();
    assert_eq!(balance.tokens(), &["c0", "c1"]);

    // The objective is one contiguous block of cost terms.
    let cost = Operand::vector(gens.clone(), vec![30.0, 0.0]).unwrap();
    let objective = linexpr(&[(cost, &p)]).unwrap().join();
    assert_eq!(objective, "+30.0 x0 +0.0 x1 +30.0 x2 +0.0 x3 ");

    let (bounds, constraints) = writer.into_sinks();
    let bounds = String::from_utf8(bounds).unwrap();
    let constraints = String::from_utf8(constraints).unwrap();

    assert_eq!(
        bounds,
        "+0.0  <= x0 <= +100.0 \n\
         +0.0  <= x1 <= +50.0 \n\
         +0.0  <= x2 <= +100.0 \n\
         +0.0  <= x3 <= +50.0 \n"
    );
    assert_eq!(
        constraints,
        "c0:\n+1.0 x0 +1.0 x1 =\n+80.0 \n\n\
         c1:\n+1.0 x2 +1.0 x3 =\n+120.0 \n\n"
    );
}

#[test]
fn reference_table_scatter_round_trip() {
    let gens = Axis::new(["coal", "wind"]);
    let mut writer = ProblemWriter::new(Vec::new(), Vec::new());
    let p = writer
        .write_bounds(
            &Operand::Scalar(0.0),
            &Operand::Scalar(1.0),
            Some(vec![gens.clone()]),
        )
        .unwrap();

    let mut table = RefTable::new();
    table.set_ref("Generator", "p", p.clone(), false, "dispatch");

    let got = table.get_ref(TokenKind::Variable, "Generator", "p").unwrap();
    assert_eq!(got.tokens(), p.tokens());

    // Consume once values are scattered back.
    let taken = table.take_ref(TokenKind::Variable, "Generator", "p").unwrap();
    assert_eq!(taken.tokens(), p.tokens());
    assert!(table.get_ref(TokenKind::Variable, "Generator", "p").is_err());
}

#[test]
fn file_backed_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let bounds_path = dir.path().join("problem.bounds");
    let cons_path = dir.path().join("problem.cons");

    let bounds = BufWriter::new(fs::File::create(&bounds_path).unwrap());
    let constraints = BufWriter::new(fs::File::create(&cons_path).unwrap());
    let mut writer = ProblemWriter::new(bounds, constraints);

    writer
        .write_bounds(
            &Operand::Scalar(0.0),
            &Operand::Scalar(2.0),
            Some(vec![Axis::new(["g1", "g2"])]),
        )
        .unwrap();
    writer.flush().unwrap();
    drop(writer);

    let text = fs::read_to_string(&bounds_path).unwrap();
    assert_eq!(text, "+0.0  <= x0 <= +2.0 \n+0.0  <= x1 <= +2.0 \n");
}
