// Copyright 2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License

/*! Print the status of jobs, optionally submitting one first.
 */

#[macro_use] extern crate clap;
extern crate failure;
extern crate torque;

use clap::{Arg, App};
use failure::Error;
use std::process;
use torque::{AttributeRequest, Connection};

fn main() {
    let matches = App::new("jobstat")
        .version(crate_version!())
        .about("Print the status of jobs on a PBS server.")
        .arg(Arg::with_name("server")
             .long("server")
             .short("s")
             .takes_value(true)
             .help("The server to connect to (default: the library's choice)"))
        .arg(Arg::with_name("submit")
             .long("submit")
             .takes_value(true)
             .value_name("SCRIPT")
             .help("Submit this job script before querying"))
        .arg(Arg::with_name("queue")
             .long("queue")
             .short("q")
             .takes_value(true)
             .default_value("batch")
             .help("The destination queue for --submit"))
        .arg(Arg::with_name("JOBID")
             .help("The job to query (default: all jobs)")
             .index(1))
        .get_matches();

    process::exit(match inner(&matches) {
        Ok(code) => code,

        Err(e) => {
            eprintln!("fatal error in jobstat");
            for cause in e.iter_chain() {
                eprintln!("  caused by: {}", cause);
            }
            1
        },
    });
}


fn inner(matches: &clap::ArgMatches) -> Result<i32, Error> {
    let server = matches.value_of("server");
    println!("default server: {}", torque::default_server(&torque::LibTorque).unwrap_or_else(|| "(none)".to_owned()));

    let conn = Connection::connect(server)?;
    let mut jobid = matches.value_of("JOBID").map(|s| s.to_owned());

    if let Some(script) = matches.value_of("submit") {
        let queue = matches.value_of("queue").unwrap_or("batch");
        let resources = [
            AttributeRequest::resource("Resource_List", "walltime", "00:05:00"),
            AttributeRequest::resource("Resource_List", "nodes", "1"),
        ];
        let id = conn.submit(&resources, script, queue, None)?;
        println!("new job id: {}", id);
        jobid = Some(id);
    }

    let filter = [
        AttributeRequest::name_only("Job_Name"),
        AttributeRequest::name_only("job_state"),
        AttributeRequest::name_only("queue"),
    ];

    for job in conn.status_jobs(jobid.as_ref().map(|s| s.as_str()), &filter, None)? {
        println!("{} {}", job.name, job.attribute("Job_Name").unwrap_or(""));
        println!("  state: {}", job.attribute("job_state").unwrap_or("?"));
        println!("  queue: {}", job.attribute("queue").unwrap_or("?"));

        if !job.text.is_empty() {
            println!("  note: {}", job.text);
        }
    }

    conn.disconnect();
    Ok(0)
}
