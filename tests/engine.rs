// rsas - an interpreter for a subset of the SAS language.
// Copyright (C) 2026 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! End-to-end tests: whole programs through the engine, checked against the
//! catalog and the two output streams.

use rsas::{
    catalog::Dataset,
    identifier::Identifier,
    output::MemorySink,
    value::Value,
    Engine, ExitStatus,
};

struct Run {
    engine: Engine,
    status: ExitStatus,
    log: MemorySink,
    listing: MemorySink,
}

fn run(source: &str) -> Run {
    let log = MemorySink::new();
    let listing = MemorySink::new();
    let mut engine = Engine::new(Box::new(log.clone()), Box::new(listing.clone()));
    let status = engine.execute_program(source);
    Run {
        engine,
        status,
        log,
        listing,
    }
}

fn cell(dataset: &Dataset, row: usize, column: &str) -> Value {
    dataset.value(row, &Identifier::new(column))
}

fn column_names(dataset: &Dataset) -> Vec<String> {
    dataset
        .columns()
        .iter()
        .map(|meta| meta.name.to_string())
        .collect()
}

#[test]
fn single_numeric_output() {
    let run = run("data a; a = 10; output; run;");
    assert_eq!(run.status, ExitStatus::Clean);

    let a = run.engine.catalog().dataset("a").unwrap();
    assert_eq!(a.n_columns(), 1);
    assert_eq!(a.n_rows(), 1);
    assert_eq!(cell(a, 0, "a"), Value::from(10.0));
}

#[test]
fn two_outputs_heterogeneous_types() {
    let run = run(
        "data a; a = 10; output; b = \"This is a string variable!\"; output; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);

    let a = run.engine.catalog().dataset("a").unwrap();
    assert_eq!(a.n_columns(), 2);
    assert_eq!(a.n_rows(), 2);
    // The first row was emitted before `b` existed, so `b` reads as the
    // string missing value there.
    assert_eq!(cell(a, 0, "a"), Value::from(10.0));
    assert_eq!(cell(a, 0, "b"), Value::string(""));
    assert_eq!(cell(a, 1, "a"), Value::from(10.0));
    assert_eq!(cell(a, 1, "b"), Value::string("This is a string variable!"));
}

#[test]
fn input_datalines() {
    let run = run(
        "data employees; input name $ age; datalines;\n\
         john 23\n\
         mary 30\n\
         ;\n\
         run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);

    let employees = run.engine.catalog().dataset("employees").unwrap();
    assert_eq!(employees.n_columns(), 2);
    assert_eq!(employees.n_rows(), 2);
    let name = employees.column(&Identifier::new("name")).unwrap();
    assert!(!name.is_numeric);
    let age = employees.column(&Identifier::new("age")).unwrap();
    assert!(age.is_numeric);
    assert_eq!(cell(employees, 0, "name"), Value::string("john"));
    assert_eq!(cell(employees, 0, "age"), Value::from(23.0));
    assert_eq!(cell(employees, 1, "name"), Value::string("mary"));
    assert_eq!(cell(employees, 1, "age"), Value::from(30.0));
}

#[test]
fn function_pipeline_with_conditional_output() {
    let run = run(
        "data in; input x y; datalines;\n\
         4 20\n\
         16 30\n\
         9 15\n\
         25 40\n\
         ;\n\
         run;\n\
         data out; set in;\n\
           sqrt_x = sqrt(x);\n\
           abs_diff = abs(y - 25);\n\
           log_y = log(y);\n\
           if sqrt_x > 3 and abs_diff < 10 then output;\n\
         run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);

    let out = run.engine.catalog().dataset("out").unwrap();
    assert_eq!(
        column_names(out),
        vec!["x", "y", "sqrt_x", "abs_diff", "log_y"]
    );
    assert_eq!(out.n_rows(), 1);
    assert_eq!(cell(out, 0, "x"), Value::from(16.0));
    assert_eq!(cell(out, 0, "y"), Value::from(30.0));
    assert_eq!(cell(out, 0, "sqrt_x"), Value::from(4.0));
    assert_eq!(cell(out, 0, "abs_diff"), Value::from(5.0));
    let log_y = cell(out, 0, "log_y").as_number().unwrap();
    assert!((log_y - 3.4011973817).abs() < 1e-7);
}

#[test]
fn if_else_with_do_blocks() {
    let run = run(
        "data in; input x y; datalines;\n\
         5 10\n\
         15 20\n\
         10 15\n\
         20 25\n\
         ;\n\
         run;\n\
         data out; set in;\n\
           if x > 10 then do; status = 'High'; y = y * 2; end;\n\
           else do; status = 'Low'; y = y + 5; end;\n\
           output;\n\
         run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);

    let out = run.engine.catalog().dataset("out").unwrap();
    assert_eq!(column_names(out), vec!["x", "y", "status"]);
    assert_eq!(out.n_rows(), 4);
    assert_eq!(cell(out, 0, "x"), Value::from(5.0));
    assert_eq!(cell(out, 0, "y"), Value::from(15.0));
    assert_eq!(cell(out, 0, "status"), Value::string("Low"));
    assert_eq!(cell(out, 1, "x"), Value::from(15.0));
    assert_eq!(cell(out, 1, "y"), Value::from(40.0));
    assert_eq!(cell(out, 1, "status"), Value::string("High"));
    assert_eq!(cell(out, 2, "status"), Value::string("Low"));
    assert_eq!(cell(out, 3, "status"), Value::string("High"));
}

#[test]
fn merge_later_dataset_wins_conflicts() {
    let run = run(
        "data ds1; input id v w1; datalines;\n\
         1 10 100\n\
         2 20 200\n\
         ;\n\
         run;\n\
         data ds2; input id v w2; datalines;\n\
         1 11 111\n\
         2 21 222\n\
         ;\n\
         run;\n\
         data out; merge ds1 ds2; by id; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);

    let out = run.engine.catalog().dataset("out").unwrap();
    assert_eq!(out.n_rows(), 2);
    // The shared variable `v` takes its value from ds2, the later dataset.
    assert_eq!(cell(out, 0, "v"), Value::from(11.0));
    assert_eq!(cell(out, 1, "v"), Value::from(21.0));
    // Non-conflicting variables come through from both sides.
    assert_eq!(cell(out, 0, "w1"), Value::from(100.0));
    assert_eq!(cell(out, 0, "w2"), Value::from(111.0));
}

#[test]
fn merge_emits_union_of_keys() {
    let run = run(
        "data ds1; input id a; datalines;\n\
         1 1\n\
         3 3\n\
         ;\n\
         run;\n\
         data ds2; input id b; datalines;\n\
         2 2\n\
         3 30\n\
         4 4\n\
         ;\n\
         run;\n\
         data out; merge ds1 ds2; by id; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);

    let out = run.engine.catalog().dataset("out").unwrap();
    // Keys 1, 2, 3, 4: one row per key in the union.
    assert_eq!(out.n_rows(), 4);
    assert_eq!(cell(out, 0, "id"), Value::from(1.0));
    assert_eq!(cell(out, 1, "id"), Value::from(2.0));
    assert_eq!(cell(out, 2, "id"), Value::from(3.0));
    assert_eq!(cell(out, 3, "id"), Value::from(4.0));
    // Key 3 appears in both inputs and matched into a single row.
    assert_eq!(cell(out, 2, "a"), Value::from(3.0));
    assert_eq!(cell(out, 2, "b"), Value::from(30.0));
    // Key 1 only exists in ds1, so ds2's variable is missing there.
    assert_eq!(cell(out, 0, "b"), Value::missing());
}

#[test]
fn merge_sorts_unsorted_inputs() {
    let run = run(
        "data ds1; input id a; datalines;\n\
         3 3\n\
         1 1\n\
         ;\n\
         run;\n\
         data ds2; input id b; datalines;\n\
         1 10\n\
         3 30\n\
         ;\n\
         run;\n\
         data out; merge ds1 ds2; by id; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);
    assert!(run.log.contents().contains("was sorted by id"));

    let out = run.engine.catalog().dataset("out").unwrap();
    assert_eq!(out.n_rows(), 2);
    assert_eq!(cell(out, 0, "id"), Value::from(1.0));
    assert_eq!(cell(out, 0, "a"), Value::from(1.0));
    assert_eq!(cell(out, 0, "b"), Value::from(10.0));
}

#[test]
fn set_round_trip_preserves_everything() {
    let run = run(
        "data in; input x y $ z; datalines;\n\
         1 aa 10\n\
         2 bb 20\n\
         3 cc 30\n\
         ;\n\
         run;\n\
         data copy; set in; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);

    let original = run.engine.catalog().dataset("in").unwrap();
    let copy = run.engine.catalog().dataset("copy").unwrap();
    assert_eq!(copy.n_rows(), original.n_rows());
    assert_eq!(column_names(copy), column_names(original));
    for row in 0..original.n_rows() {
        for meta in original.columns() {
            assert_eq!(
                copy.value(row, &meta.name),
                original.value(row, &meta.name)
            );
        }
    }
}

#[test]
fn output_count_matches_output_statements() {
    let run = run(
        "data a; do i = 1 to 3; output; output; end; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);
    // Two OUTPUTs per iteration, three iterations, no implicit output.
    assert_eq!(run.engine.catalog().dataset("a").unwrap().n_rows(), 6);
}

#[test]
fn retain_accumulates_across_iterations() {
    let run = run(
        "data in; input x; datalines;\n\
         1\n\
         2\n\
         3\n\
         4\n\
         ;\n\
         run;\n\
         data out; set in; retain total 0; total = total + x; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);

    let out = run.engine.catalog().dataset("out").unwrap();
    assert_eq!(cell(out, 0, "total"), Value::from(1.0));
    assert_eq!(cell(out, 1, "total"), Value::from(3.0));
    assert_eq!(cell(out, 2, "total"), Value::from(6.0));
    assert_eq!(cell(out, 3, "total"), Value::from(10.0));
}

#[test]
fn unretained_variables_reset_each_iteration() {
    let run = run(
        "data in; input x; datalines;\n\
         5\n\
         0\n\
         ;\n\
         run;\n\
         data out; set in; if x > 0 then flag = 1; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);

    let out = run.engine.catalog().dataset("out").unwrap();
    assert_eq!(cell(out, 0, "flag"), Value::from(1.0));
    // Without RETAIN, `flag` resets to missing for the second row.
    assert_eq!(cell(out, 1, "flag"), Value::missing());
}

#[test]
fn proc_sort_with_where_nodupkey_and_out() {
    let run = run(
        "data in; input id x; datalines;\n\
         3 1\n\
         1 2\n\
         2 3\n\
         1 4\n\
         2 5\n\
         ;\n\
         run;\n\
         proc sort data=in out=sorted nodupkey; by id; where x < 5; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);

    let sorted = run.engine.catalog().dataset("sorted").unwrap();
    // WHERE drops (2,5); NODUPKEY keeps the first row of each id group.
    assert_eq!(sorted.n_rows(), 3);
    assert_eq!(cell(sorted, 0, "id"), Value::from(1.0));
    assert_eq!(cell(sorted, 0, "x"), Value::from(2.0));
    assert_eq!(cell(sorted, 1, "id"), Value::from(2.0));
    assert_eq!(cell(sorted, 2, "id"), Value::from(3.0));
    assert!(run
        .log
        .contents()
        .contains("1 observations with duplicate key values were deleted."));
    // The input dataset is untouched when OUT= is given.
    assert_eq!(run.engine.catalog().dataset("in").unwrap().n_rows(), 5);
}

#[test]
fn proc_sort_is_idempotent() {
    let source_rows = "data in; input id x; datalines;\n\
         2 20\n\
         1 10\n\
         3 30\n\
         ;\n\
         run;\n";
    let once = run(&format!(
        "{source_rows} proc sort data=in; by id; run;"
    ));
    let twice = run(&format!(
        "{source_rows} proc sort data=in; by id; run; proc sort data=in; by id; run;"
    ));

    let first = once.engine.catalog().dataset("in").unwrap();
    let second = twice.engine.catalog().dataset("in").unwrap();
    assert_eq!(first.n_rows(), second.n_rows());
    for row in 0..first.n_rows() {
        assert_eq!(cell(first, row, "id"), cell(second, row, "id"));
        assert_eq!(cell(first, row, "x"), cell(second, row, "x"));
    }
}

#[test]
fn proc_print_listing_format() {
    let run = run(
        "title 'Employee Report';\n\
         data a; input name $ age; datalines;\n\
         john 23\n\
         mary 30\n\
         ;\n\
         run;\n\
         proc print data=a; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);
    let lines = run.listing.lines();
    assert_eq!(lines[0], "Employee Report");
    assert_eq!(lines[1], "Obs\tname\tage");
    assert_eq!(lines[2], "1\tjohn\t23");
    assert_eq!(lines[3], "2\tmary\t30");
}

#[test]
fn proc_print_noobs_obs_limit_and_vars() {
    let run = run(
        "data a; input x y; datalines;\n\
         1 10\n\
         2 20\n\
         3 30\n\
         ;\n\
         run;\n\
         proc print data=a(obs=2) noobs; var y; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);
    assert_eq!(run.listing.lines(), vec!["y", "10", "20"]);
}

#[test]
fn proc_means_statistics() {
    let run = run(
        "data a; input x; datalines;\n\
         2\n\
         4\n\
         6\n\
         8\n\
         ;\n\
         run;\n\
         proc means data=a n mean min max; var x; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);
    let lines = run.listing.lines();
    assert_eq!(lines[0], "Variable\tN\tMean\tMin\tMax");
    assert_eq!(lines[1], "x\t4\t5\t2\t8");
}

#[test]
fn proc_freq_counts_descending() {
    let run = run(
        "data a; input color $; datalines;\n\
         red\n\
         blue\n\
         red\n\
         green\n\
         red\n\
         blue\n\
         ;\n\
         run;\n\
         proc freq data=a; tables color; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);
    let lines = run.listing.lines();
    assert_eq!(lines[0], "color\tFrequency");
    assert_eq!(lines[1], "red\t3");
    assert_eq!(lines[2], "blue\t2");
    assert_eq!(lines[3], "green\t1");

    // The counts total the non-missing observations.
    let total: usize = lines[1..]
        .iter()
        .map(|line| line.rsplit('\t').next().unwrap().parse::<usize>().unwrap())
        .sum();
    assert_eq!(total, 6);
}

#[test]
fn proc_freq_skips_missing_values() {
    let run = run(
        "data a; input x; datalines;\n\
         1\n\
         .\n\
         1\n\
         2\n\
         ;\n\
         run;\n\
         proc freq data=a; tables x; run;",
    );
    // "." fails numeric conversion and becomes missing (with a warning).
    let lines = run.listing.lines();
    let total: usize = lines[1..]
        .iter()
        .map(|line| line.rsplit('\t').next().unwrap().parse::<usize>().unwrap())
        .sum();
    assert_eq!(total, 3);
}

#[test]
fn dataset_names_are_case_insensitive() {
    let upper = run("data A; a = 1; run; DATA B; SET a; RUN;");
    let lower = run("data a; a = 1; run; data b; set A; run;");
    assert_eq!(upper.status, ExitStatus::Clean);
    assert_eq!(lower.status, ExitStatus::Clean);

    let b_upper = upper.engine.catalog().dataset("b").unwrap();
    let b_lower = lower.engine.catalog().dataset("B").unwrap();
    assert_eq!(b_upper.n_rows(), 1);
    assert_eq!(b_lower.n_rows(), 1);
    assert_eq!(cell(b_upper, 0, "A"), cell(b_lower, 0, "a"));
}

#[test]
fn keep_filters_and_reorders() {
    let run = run(
        "data a; x = 1; y = 2; z = 3; keep z x; run;",
    );
    let a = run.engine.catalog().dataset("a").unwrap();
    assert_eq!(column_names(a), vec!["z", "x"]);
}

#[test]
fn drop_preserves_first_seen_order() {
    let run = run("data a; x = 1; y = 2; z = 3; drop y; run;");
    let a = run.engine.catalog().dataset("a").unwrap();
    assert_eq!(column_names(a), vec!["x", "z"]);
}

#[test]
fn arrays_are_one_based_and_bounds_checked() {
    let ok = run(
        "data a; array q[3] q1 q2 q3;\n\
         do i = 1 to 3; q[i] = i * i; end;\n\
         run;",
    );
    assert_eq!(ok.status, ExitStatus::Clean);
    let a = ok.engine.catalog().dataset("a").unwrap();
    assert_eq!(cell(a, 0, "q1"), Value::from(1.0));
    assert_eq!(cell(a, 0, "q3"), Value::from(9.0));

    let bad = run("data a; array q[2] q1 q2; q[3] = 1; run;");
    assert_eq!(bad.status, ExitStatus::Errors);
    assert!(bad.log.contents().contains("out of range"));
}

#[test]
fn zero_loop_step_is_an_error() {
    let run = run("data a; do i = 1 to 5 by 0; end; run;");
    assert_eq!(run.status, ExitStatus::Errors);
    assert!(run.log.contents().contains("BY value is zero"));
}

#[test]
fn runaway_loop_hits_the_cap() {
    let run = run("data a; x = 1; do while (x > 0); x = x + 1; end; run;");
    assert_eq!(run.status, ExitStatus::Errors);
    assert!(run.log.contents().contains("Possible infinite loop"));
}

#[test]
fn do_until_runs_at_least_once() {
    let run = run("data a; n = 0; do until (1); n = n + 1; end; run;");
    assert_eq!(run.status, ExitStatus::Clean);
    let a = run.engine.catalog().dataset("a").unwrap();
    assert_eq!(cell(a, 0, "n"), Value::from(1.0));
}

#[test]
fn division_by_zero_warns_and_yields_missing() {
    let run = run("data a; x = 1 / 0; run;");
    assert_eq!(run.status, ExitStatus::Warnings);
    let a = run.engine.catalog().dataset("a").unwrap();
    assert_eq!(cell(a, 0, "x"), Value::missing());
    assert!(run.log.contents().contains("Division by zero"));
}

#[test]
fn missing_propagates_through_arithmetic() {
    let run = run(
        "data a; x = sqrt(-4); y = x + 1; z = x == x; w = x == 0; run;",
    );
    let a = run.engine.catalog().dataset("a").unwrap();
    assert_eq!(cell(a, 0, "x"), Value::missing());
    assert_eq!(cell(a, 0, "y"), Value::missing());
    // missing == missing is true; missing == 0 is false.
    assert_eq!(cell(a, 0, "z"), Value::from(1.0));
    assert_eq!(cell(a, 0, "w"), Value::from(0.0));
}

#[test]
fn undefined_dataset_aborts_step_but_not_program() {
    let run = run("data a; set ghost; run; data b; x = 1; run;");
    assert_eq!(run.status, ExitStatus::Errors);
    assert!(run.engine.catalog().dataset("a").is_none());
    assert!(run.engine.catalog().dataset("b").is_some());
    assert!(run.log.contents().contains("WORK.ghost was not found"));
}

#[test]
fn uninitialized_variable_warns_and_is_missing() {
    let run = run("data a; y = x + 1; run;");
    assert_eq!(run.status, ExitStatus::Warnings);
    let a = run.engine.catalog().dataset("a").unwrap();
    assert_eq!(cell(a, 0, "y"), Value::missing());
    assert!(run.log.contents().contains("x is uninitialized"));
}

#[test]
fn libname_registers_a_library() {
    let run = run(
        "libname mylib \"/tmp/data\";\n\
         data mylib.things; v = 1; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);
    let things = run.engine.catalog().dataset("mylib.things").unwrap();
    assert_eq!(things.name, "MYLIB.things");
    assert_eq!(
        run.engine.catalog().library("MYLIB").unwrap().path,
        "/tmp/data"
    );
}

#[test]
fn string_functions_compose() {
    let run = run(
        "data a;\n\
         s = substr(upcase(trim('  hello  ')), 1, 4);\n\
         t = lowcase(left('  ABC'));\n\
         run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);
    let a = run.engine.catalog().dataset("a").unwrap();
    // trim removes only trailing blanks, so position 1 is still a blank.
    assert_eq!(cell(a, 0, "s"), Value::string("  HE"));
    assert_eq!(cell(a, 0, "t"), Value::string("abc"));
}

#[test]
fn comments_do_not_reach_execution() {
    let run = run(
        "/* block comment */\n\
         * line comment ended here;\n\
         %* macro comment too;\n\
         data a; x = 1; run;",
    );
    assert_eq!(run.status, ExitStatus::Clean);
    assert_eq!(run.engine.catalog().dataset("a").unwrap().n_rows(), 1);
}
