mod common;

use common::{binary, mem_fs};
use minifs::{
    fs::inode_table::InodeType,
    shell::{Flow, Shell},
    FileSystem, MemDisk,
};

/// 执行一行，返回流程和输出文本
fn run(shell: &mut Shell<FileSystem<MemDisk>>, line: &str) -> (Flow, String) {
    let mut out = Vec::new();
    let flow = shell.handle_line(line, &mut out).unwrap();
    (flow, String::from_utf8_lossy(&out).into_owned())
}

#[test]
fn mutating_commands_print_nothing() {
    let mut shell = Shell::new(mem_fs());
    for line in ["mkdir /d", "touch /d/a", "touch /b", "rm /b", "rmdir /d"] {
        let (flow, out) = run(&mut shell, line);
        assert_eq!(flow, Flow::Continue);
        assert!(out.is_empty(), "{line}: {out}");
    }
    assert!(shell.executor().list_dir("/").unwrap().is_empty());
}

#[test]
fn listing_and_reading() {
    let mut fs = mem_fs();
    fs.create_entry("/d", InodeType::Directory, None).unwrap();
    fs.create_entry("/d/x", InodeType::File, Some(b"first line\nsecond"))
        .unwrap();
    fs.create_entry("/d/y", InodeType::File, None).unwrap();
    let mut shell = Shell::new(fs);

    let (_, out) = run(&mut shell, "ls /d");
    assert_eq!(out, "x\ny\n");

    let (_, out) = run(&mut shell, "cat /d/x");
    assert_eq!(out, "first line\nsecond\n");

    let (_, out) = run(&mut shell, "stat /d/x");
    assert!(out.contains("regular file"));
    assert!(out.contains("size: 17 bytes"));

    // 空目录和空文件不输出任何东西
    let (_, out) = run(&mut shell, "cat /d/y");
    assert!(out.is_empty());
}

#[test]
fn errors_are_reported_and_the_shell_goes_on() {
    let mut shell = Shell::new(mem_fs());
    shell.handle_line("mkdir /d", &mut Vec::new()).unwrap();

    let cases = [
        ("cat /nope", "no such file or directory"),
        ("rm /d", "not a regular file"),
        ("cat /d", "not a regular file"),
        ("touch", "Usage: touch <path>"),
        ("format /", "unknown command"),
        ("touch /much_too_long", "invalid path"),
    ];
    for (line, expected) in cases {
        let (flow, out) = run(&mut shell, line);
        assert_eq!(flow, Flow::Continue);
        assert!(out.contains("Error:"), "{line}: {out}");
        assert!(out.contains(expected), "{line}: {out}");
    }
}

#[test]
fn get_and_put_copy_binary_content() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.bin");
    let target = dir.path().join("out.bin");
    let content = binary(5000);
    std::fs::write(&source, &content).unwrap();

    let mut shell = Shell::new(mem_fs());
    let (_, out) = run(&mut shell, &format!("get {} /blob", source.display()));
    assert!(out.is_empty(), "{out}");
    let (_, out) = run(&mut shell, &format!("put /blob {}", target.display()));
    assert!(out.is_empty(), "{out}");

    assert_eq!(std::fs::read(&target).unwrap(), content);
    assert_eq!(shell.executor().read_path("/blob").unwrap(), content);
}

#[test]
fn get_of_a_missing_host_file_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");

    let mut shell = Shell::new(mem_fs());
    let (_, out) = run(&mut shell, &format!("get {} /f", missing.display()));
    assert!(out.contains("Error:"));
    assert!(shell.executor().list_dir("/").unwrap().is_empty());
    assert_eq!(shell.executor().free_inodes(), 15);
}

#[test]
fn quit_and_exit_stop_the_loop() {
    let mut shell = Shell::new(mem_fs());
    assert_eq!(run(&mut shell, "quit").0, Flow::Quit);
    assert_eq!(run(&mut shell, "exit").0, Flow::Quit);
    assert_eq!(run(&mut shell, "   ").0, Flow::Continue);
}

#[test]
fn help_lists_the_commands() {
    let mut shell = Shell::new(mem_fs());
    let (_, out) = run(&mut shell, "help");
    for command in ["touch", "mkdir", "rmdir", "cat", "ls", "get", "put", "quit"] {
        assert!(out.contains(command), "{command} missing from help");
    }
}
